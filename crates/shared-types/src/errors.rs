//! # Error Types
//!
//! Failures while marshalling, unmarshalling or minting envelopes.

use crate::entities::HeaderType;
use shared_crypto::CryptoError;
use thiserror::Error;

/// Errors raised by the message model.
#[derive(Debug, Clone, Error)]
pub enum EnvelopeError {
    /// Bytes could not be decoded into the expected structure.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// A structure could not be encoded.
    #[error("Marshal failed: {0}")]
    Marshal(String),

    /// Payload carries no header.
    #[error("Payload header missing")]
    MissingHeader,

    /// Channel header carries a type code this service does not know.
    #[error("Unknown header type: {0}")]
    UnknownHeaderType(i32),

    /// Channel header type differs from the one required.
    #[error("Unexpected header type: expected {expected:?}, got {actual:?}")]
    UnexpectedType {
        /// Required type.
        expected: HeaderType,
        /// Type found.
        actual: HeaderType,
    },

    /// The local signer failed.
    #[error("Signing failed: {0}")]
    Signing(#[from] CryptoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EnvelopeError::UnknownHeaderType(9);
        assert_eq!(err.to_string(), "Unknown header type: 9");
    }
}
