//! Message classification
//!
//! Classification is derived purely from the channel header's type code.

use crate::domain::errors::ProcessorError;
use shared_types::{ChannelHeader, HeaderType};
use std::fmt;

/// The possible processing classes of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Standard (endorser or otherwise non-config) messages.
    /// Processed by `process_normal_msg`.
    NormalMsg,

    /// Configuration related messages.
    /// Processed by `process_config_update_msg`, and always ordered into a
    /// block of their own.
    ConfigUpdateMsg,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormalMsg => write!(f, "NormalMsg"),
            Self::ConfigUpdateMsg => write!(f, "ConfigUpdateMsg"),
        }
    }
}

/// Classify a message by its channel header.
///
/// CONFIG and ORDERER_TRANSACTION are the results of config-update
/// processing; they are config-class so the sequencing loop isolates them.
pub fn classify(chdr: &ChannelHeader) -> Result<Classification, ProcessorError> {
    let header_type = chdr
        .header_type()
        .map_err(|e| ProcessorError::MalformedMessage(e.to_string()))?;

    Ok(match header_type {
        HeaderType::ConfigUpdate | HeaderType::Config | HeaderType::OrdererTransaction => {
            Classification::ConfigUpdateMsg
        }
        HeaderType::EndorserTransaction | HeaderType::Message | HeaderType::PeerResourceUpdate => {
            Classification::NormalMsg
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::make_channel_header;

    fn header(header_type: HeaderType) -> ChannelHeader {
        make_channel_header(header_type, 0, "mychannel", 0, String::new())
    }

    #[test]
    fn test_config_update_is_config_class() {
        assert_eq!(
            classify(&header(HeaderType::ConfigUpdate)).unwrap(),
            Classification::ConfigUpdateMsg
        );
    }

    #[test]
    fn test_config_results_are_config_class() {
        assert_eq!(
            classify(&header(HeaderType::Config)).unwrap(),
            Classification::ConfigUpdateMsg
        );
        assert_eq!(
            classify(&header(HeaderType::OrdererTransaction)).unwrap(),
            Classification::ConfigUpdateMsg
        );
    }

    #[test]
    fn test_other_types_are_normal() {
        for header_type in [
            HeaderType::EndorserTransaction,
            HeaderType::Message,
            HeaderType::PeerResourceUpdate,
        ] {
            assert_eq!(
                classify(&header(header_type)).unwrap(),
                Classification::NormalMsg
            );
        }
    }

    #[test]
    fn test_unsupported_type_is_malformed() {
        let mut chdr = header(HeaderType::Message);
        chdr.header_type = 99;

        assert!(matches!(
            classify(&chdr),
            Err(ProcessorError::MalformedMessage(_))
        ));
    }
}
