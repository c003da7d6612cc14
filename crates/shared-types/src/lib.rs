//! # Shared Types Crate
//!
//! This crate contains the message and block model shared by the message
//! processors and the sequencing chains.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Envelopes, headers, blocks and config
//!   transactions are defined once, here.
//! - **Sign What You Store**: Nested headers stay marshalled inside the
//!   payload, so the signed bytes are the stored bytes.
//! - **Immutable Admission**: Nothing in the ordering path rewrites an
//!   envelope; new envelopes wrap old ones instead.

pub mod configtx;
pub mod entities;
pub mod envelope;
pub mod errors;

pub use configtx::*;
pub use entities::*;
pub use envelope::{
    compute_tx_id, create_signed_envelope, make_channel_header, marshal, unmarshal,
    unmarshal_envelope_of_type,
};
pub use errors::*;
