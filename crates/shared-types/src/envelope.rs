//! # Envelope Utilities
//!
//! Marshalling and construction helpers for [`Envelope`]s.
//!
//! ## Signing Properties
//!
//! - The signature covers the marshalled payload bytes exactly as stored.
//! - Every envelope minted here carries a fresh nonce; its `tx_id` is the
//!   hex SHA-256 of nonce ‖ creator.

use crate::entities::{ChannelHeader, Envelope, Header, HeaderType, Payload, SignatureHeader};
use crate::errors::EnvelopeError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_crypto::{create_nonce, sha256_many, LocalSigner};
use std::time::{SystemTime, UNIX_EPOCH};

/// Marshal a value into its wire bytes.
pub fn marshal<T: Serialize>(value: &T) -> Result<Vec<u8>, EnvelopeError> {
    bincode::serialize(value).map_err(|e| EnvelopeError::Marshal(e.to_string()))
}

/// Unmarshal wire bytes into a value.
pub fn unmarshal<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EnvelopeError> {
    bincode::deserialize(bytes).map_err(|e| EnvelopeError::Malformed(e.to_string()))
}

/// Transaction ID for a nonce and creator.
pub fn compute_tx_id(nonce: &[u8], creator: &[u8]) -> String {
    hex::encode(sha256_many(&[nonce, creator]))
}

/// Build a channel header stamped with the current time.
pub fn make_channel_header(
    header_type: HeaderType,
    version: i32,
    channel_id: &str,
    epoch: u64,
    tx_id: String,
) -> ChannelHeader {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    ChannelHeader {
        header_type: header_type.code(),
        version,
        timestamp,
        channel_id: channel_id.to_string(),
        tx_id,
        epoch,
    }
}

/// Build a signed envelope of `header_type` for `channel_id` carrying `data`.
pub fn create_signed_envelope<T: Serialize>(
    header_type: HeaderType,
    channel_id: &str,
    signer: &dyn LocalSigner,
    data: &T,
    msg_version: i32,
    epoch: u64,
) -> Result<Envelope, EnvelopeError> {
    let creator = signer.identity();
    let nonce = create_nonce().to_vec();
    let tx_id = compute_tx_id(&nonce, &creator);

    let channel_header = make_channel_header(header_type, msg_version, channel_id, epoch, tx_id);
    let signature_header = SignatureHeader { creator, nonce };

    let payload = Payload {
        header: Some(Header {
            channel_header: marshal(&channel_header)?,
            signature_header: marshal(&signature_header)?,
        }),
        data: marshal(data)?,
    };
    let payload_bytes = marshal(&payload)?;
    let signature = signer.sign(&payload_bytes)?;

    Ok(Envelope {
        payload: payload_bytes,
        signature,
    })
}

/// Unmarshal an envelope's data, requiring its channel header to be `expected`.
pub fn unmarshal_envelope_of_type<T: DeserializeOwned>(
    env: &Envelope,
    expected: HeaderType,
) -> Result<(ChannelHeader, T), EnvelopeError> {
    let payload = env.payload()?;
    let channel_header = payload.channel_header()?;

    let actual = channel_header.header_type()?;
    if actual != expected {
        return Err(EnvelopeError::UnexpectedType { expected, actual });
    }

    let data = unmarshal(&payload.data)?;
    Ok((channel_header, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configtx::ConfigUpdateEnvelope;
    use shared_crypto::Ed25519Signer;

    #[test]
    fn test_signed_envelope_headers() {
        let signer = Ed25519Signer::from_seed([1u8; 32]);
        let env = create_signed_envelope(
            HeaderType::ConfigUpdate,
            "mychannel",
            &signer,
            &ConfigUpdateEnvelope::default(),
            0,
            0,
        )
        .unwrap();

        let payload = env.payload().unwrap();
        let chdr = payload.channel_header().unwrap();
        let shdr = payload.signature_header().unwrap();

        assert_eq!(chdr.channel_id, "mychannel");
        assert_eq!(chdr.header_type().unwrap(), HeaderType::ConfigUpdate);
        assert_eq!(shdr.creator, signer.identity());
        assert_eq!(chdr.tx_id, compute_tx_id(&shdr.nonce, &shdr.creator));
    }

    #[test]
    fn test_signature_covers_payload() {
        let signer = Ed25519Signer::from_seed([2u8; 32]);
        let env = create_signed_envelope(
            HeaderType::EndorserTransaction,
            "mychannel",
            &signer,
            &vec![1u8, 2, 3],
            0,
            0,
        )
        .unwrap();

        assert!(Ed25519Signer::verify(&signer.identity(), &env.payload, &env.signature).is_ok());
    }

    #[test]
    fn test_unmarshal_of_wrong_type() {
        let signer = Ed25519Signer::from_seed([1u8; 32]);
        let env = create_signed_envelope(
            HeaderType::EndorserTransaction,
            "mychannel",
            &signer,
            &ConfigUpdateEnvelope::default(),
            0,
            0,
        )
        .unwrap();

        let result: Result<(ChannelHeader, ConfigUpdateEnvelope), _> =
            unmarshal_envelope_of_type(&env, HeaderType::ConfigUpdate);

        assert!(matches!(
            result,
            Err(EnvelopeError::UnexpectedType {
                expected: HeaderType::ConfigUpdate,
                actual: HeaderType::EndorserTransaction,
            })
        ));
    }
}
