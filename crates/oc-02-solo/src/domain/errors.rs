//! Error types for Solo Sequencing

use thiserror::Error;

/// Errors surfaced by a chain to its callers
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    /// The chain has exited; nothing more will be admitted
    #[error("chain has halted")]
    ChainHalted,

    /// Batch settings are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from appending to a ledger
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Block number is not the ledger height
    #[error("block {actual} out of sequence, expected {expected}")]
    OutOfSequence { expected: u64, actual: u64 },

    /// Block does not link to the current tip
    #[error("block {number} does not link to the previous block")]
    PreviousHashMismatch { number: u64 },

    /// Header data hash does not match the block's envelopes
    #[error("block {number} data hash mismatch")]
    DataHashMismatch { number: u64 },
}
