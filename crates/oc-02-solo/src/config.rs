//! Configuration for Solo Sequencing

use crate::domain::errors::ChainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Batch settings shared by every solo chain
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SoloConfig {
    /// How long the first message of a batch may wait before the batch is cut
    pub batch_timeout_ms: u64,

    /// Messages per batch
    pub max_message_count: u32,

    /// Batch size the cutter aims for; larger messages get a batch of their own
    pub preferred_max_bytes: u32,
}

impl Default for SoloConfig {
    fn default() -> Self {
        Self {
            batch_timeout_ms: 2_000,
            max_message_count: 10,
            preferred_max_bytes: 512 * 1024,
        }
    }
}

impl SoloConfig {
    /// Batch timeout as a duration
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    /// Reject settings that would stall or never cut
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.batch_timeout_ms == 0 {
            return Err(ChainError::InvalidConfig(
                "batch_timeout_ms must be positive".into(),
            ));
        }
        if self.max_message_count == 0 {
            return Err(ChainError::InvalidConfig(
                "max_message_count must be positive".into(),
            ));
        }
        if self.preferred_max_bytes == 0 {
            return Err(ChainError::InvalidConfig(
                "preferred_max_bytes must be positive".into(),
            ));
        }
        Ok(())
    }
}
