//! # Shared Crypto - Signing Primitives for the Ordering Service
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Block data hashes, transaction IDs |
//! | `signer` | Ed25519 | Envelope signatures, the orderer's local identity |

#![warn(missing_docs)]

pub mod errors;
pub mod hashing;
pub mod signer;

pub use errors::CryptoError;
pub use hashing::{sha256, sha256_many, Hash};
pub use signer::{create_nonce, Ed25519Signer, LocalSigner, NONCE_SIZE};
