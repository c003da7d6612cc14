//! Inbound Ports (Driving Ports / API)

use crate::domain::classification::Classification;
use crate::domain::errors::ProcessorError;
use shared_types::{ChannelHeader, Envelope};

/// Classifies and processes any message arriving for ordering.
pub trait Processor: Send + Sync {
    /// Inspect the channel header to determine which processing is necessary.
    fn classify_msg(&self, chdr: &ChannelHeader) -> Result<Classification, ProcessorError>;

    /// Check the validity of a message against the current configuration.
    ///
    /// Returns the configuration sequence the message was validated against.
    fn process_normal_msg(&self, env: &Envelope) -> Result<u64, ProcessorError>;

    /// Apply a config update to the current configuration.
    ///
    /// On success returns the resulting config message and the sequence the
    /// config was computed from.
    fn process_config_update_msg(&self, env: &Envelope)
        -> Result<(Envelope, u64), ProcessorError>;
}
