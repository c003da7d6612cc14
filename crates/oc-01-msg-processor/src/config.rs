//! Configuration for Message Processing

use serde::{Deserialize, Serialize};

/// Default absolute maximum envelope size (10 MiB)
pub const DEFAULT_ABSOLUTE_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Per-channel processing settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Largest envelope the channel admits
    pub absolute_max_bytes: usize,
    /// Message format version for minted envelopes
    pub msg_version: i32,
    /// Epoch for minted envelopes
    pub epoch: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            absolute_max_bytes: DEFAULT_ABSOLUTE_MAX_BYTES,
            msg_version: 0,
            epoch: 0,
        }
    }
}
