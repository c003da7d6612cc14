//! Error types for Message Processing

use shared_types::EnvelopeError;
use thiserror::Error;

/// All errors that can occur while classifying or processing a message
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessorError {
    /// Header or channel ID could not be extracted
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// A rule, policy or the config manager rejected the message
    #[error("Validation failed ({rule}): {reason}")]
    ValidationFailure { rule: &'static str, reason: String },

    /// Normal message reached the system channel for a channel that does not exist
    #[error("channel does not exist: {channel_id}")]
    ChannelNotFound { channel_id: String },

    /// A step of channel-creation transaction assembly failed
    #[error("Channel creation failed for {channel_id}: {reason}")]
    ChannelCreationFailure { channel_id: String, reason: String },
}

impl ProcessorError {
    /// Short label for metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::MalformedMessage(_) => "malformed",
            Self::ValidationFailure { .. } => "validation",
            Self::ChannelNotFound { .. } => "channel_not_found",
            Self::ChannelCreationFailure { .. } => "channel_creation",
        }
    }
}

impl From<EnvelopeError> for ProcessorError {
    fn from(err: EnvelopeError) -> Self {
        Self::MalformedMessage(err.to_string())
    }
}
