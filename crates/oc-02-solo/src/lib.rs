//! # Solo Sequencing
//!
//! Orders validated messages into blocks for each channel, on a single node.
//!
//! ## Per-channel pipeline
//!
//! ```text
//! order/configure ──→ hand-off (capacity 1) ──→ sequencing task
//!                                                   │
//!                     ┌─────────────────────────────┤
//!                     ↓                             ↓
//!              normal message                 config message
//!           re-validate, batch cutter     re-validate, flush pending,
//!           arm timer if left pending       write it alone as a
//!                     │                       config block
//!                     ↓
//!          block per completed batch,
//!          or on batch timer expiry
//! ```
//!
//! ## Guarantees
//!
//! - Blocks carry messages in admission order
//! - A config message is always alone in its block
//! - `halt` may be called any number of times; teardown happens once
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! adapters/    - SizeBatchCutter, InMemoryLedger, ChainSupport
//! application/ - SoloChain, SoloConsenter, the sequencing loop
//! ports/       - Chain + Consenter (inbound), ConsenterSupport + BlockCutter (outbound)
//! domain/      - ChainError, LedgerError, HaltSignal
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{ChainSupport, InMemoryLedger, SizeBatchCutter};
pub use application::{SoloChain, SoloConsenter};
pub use config::SoloConfig;
pub use domain::{ChainError, HaltSignal, LedgerError};
pub use ports::{BlockCutter, Chain, ConfigBlockObserver, Consenter, ConsenterSupport};
