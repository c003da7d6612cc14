//! Adapters layer for solo sequencing.
//!
//! Reference cutter, ledger and the support composing them.

pub mod cutter;
pub mod ledger;
pub mod support;

pub use cutter::SizeBatchCutter;
pub use ledger::InMemoryLedger;
pub use support::ChainSupport;
