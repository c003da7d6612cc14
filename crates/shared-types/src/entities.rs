//! # Core Domain Entities
//!
//! The signed-message and block model of the ordering service.
//!
//! ## Clusters
//!
//! - **Messages**: `Envelope`, `Payload`, `Header`, `ChannelHeader`, `SignatureHeader`
//! - **Blocks**: `Block`, `BlockHeader`, `BlockData`, `BlockMetadata`
//!
//! Nested headers travel as marshalled bytes, exactly as they are signed,
//! so a receiver can always recompute what the signature covers.

use crate::envelope::unmarshal;
use crate::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use shared_crypto::sha256_many;

pub use shared_crypto::Hash;

// =============================================================================
// CLUSTER A: MESSAGES
// =============================================================================

/// Message type codes carried in a channel header.
///
/// Numbering follows the external wire protocol; it is not redefined here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum HeaderType {
    /// Opaque message.
    Message = 0,
    /// Full channel configuration.
    Config = 1,
    /// Proposed configuration update.
    ConfigUpdate = 2,
    /// Normal endorsed transaction.
    EndorserTransaction = 3,
    /// Orderer-internal transaction (channel creation).
    OrdererTransaction = 4,
    /// Peer resource update.
    PeerResourceUpdate = 7,
}

impl HeaderType {
    /// The wire value of this type.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for HeaderType {
    type Error = EnvelopeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Message),
            1 => Ok(Self::Config),
            2 => Ok(Self::ConfigUpdate),
            3 => Ok(Self::EndorserTransaction),
            4 => Ok(Self::OrdererTransaction),
            7 => Ok(Self::PeerResourceUpdate),
            other => Err(EnvelopeError::UnknownHeaderType(other)),
        }
    }
}

/// Header identifying the channel and type of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHeader {
    /// Wire type code; see [`HeaderType`].
    pub header_type: i32,
    /// Message format version.
    pub version: i32,
    /// Unix timestamp (seconds) at creation.
    pub timestamp: u64,
    /// Target channel.
    pub channel_id: String,
    /// Transaction ID (hex SHA-256 of nonce and creator).
    pub tx_id: String,
    /// Epoch the message was created in.
    pub epoch: u64,
}

impl ChannelHeader {
    /// Decode the type code, failing on codes this service does not know.
    pub fn header_type(&self) -> Result<HeaderType, EnvelopeError> {
        HeaderType::try_from(self.header_type)
    }
}

/// Creator identity and replay nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    /// Serialized identity of the creator.
    pub creator: Vec<u8>,
    /// Random nonce.
    pub nonce: Vec<u8>,
}

/// Payload header; both parts are kept marshalled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Header {
    /// Marshalled [`ChannelHeader`].
    pub channel_header: Vec<u8>,
    /// Marshalled [`SignatureHeader`].
    pub signature_header: Vec<u8>,
}

/// Message content covered by an envelope signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Routing and identity information. `None` means a malformed message.
    pub header: Option<Header>,
    /// Type-specific data.
    pub data: Vec<u8>,
}

impl Payload {
    /// Unmarshal the channel header.
    pub fn channel_header(&self) -> Result<ChannelHeader, EnvelopeError> {
        let header = self.header.as_ref().ok_or(EnvelopeError::MissingHeader)?;
        unmarshal(&header.channel_header)
    }

    /// Unmarshal the signature header.
    pub fn signature_header(&self) -> Result<SignatureHeader, EnvelopeError> {
        let header = self.header.as_ref().ok_or(EnvelopeError::MissingHeader)?;
        unmarshal(&header.signature_header)
    }
}

/// Signed message unit. Immutable once admitted for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Envelope {
    /// Marshalled [`Payload`].
    pub payload: Vec<u8>,
    /// Signature by the payload's creator over `payload`.
    pub signature: Vec<u8>,
}

impl Envelope {
    /// Unmarshal the payload.
    pub fn payload(&self) -> Result<Payload, EnvelopeError> {
        unmarshal(&self.payload)
    }

    /// Unmarshal the payload and its channel header.
    pub fn channel_header(&self) -> Result<ChannelHeader, EnvelopeError> {
        self.payload()?.channel_header()
    }

    /// Channel the envelope is addressed to.
    pub fn channel_id(&self) -> Result<String, EnvelopeError> {
        Ok(self.channel_header()?.channel_id)
    }

    /// Size counted against byte limits.
    pub fn size(&self) -> usize {
        self.payload.len() + self.signature.len()
    }
}

// =============================================================================
// CLUSTER B: BLOCKS
// =============================================================================

/// Metadata slot indices.
pub mod metadata_index {
    /// Block signatures.
    pub const SIGNATURES: usize = 0;
    /// Number of the last config block.
    pub const LAST_CONFIG: usize = 1;
    /// Transaction validation flags (peer side).
    pub const TRANSACTIONS_FILTER: usize = 2;
    /// Consenter-specific metadata.
    pub const ORDERER: usize = 3;
    /// Number of slots.
    pub const COUNT: usize = 4;
}

/// Block header linking blocks into a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Height of this block.
    pub number: u64,
    /// Hash of the previous block's header.
    pub previous_hash: Hash,
    /// Hash of this block's data.
    pub data_hash: Hash,
}

impl BlockHeader {
    /// Hash of the header; the next block's `previous_hash`.
    pub fn hash(&self) -> Hash {
        let number = self.number.to_be_bytes();
        sha256_many(&[
            number.as_slice(),
            self.previous_hash.as_slice(),
            self.data_hash.as_slice(),
        ])
    }
}

/// Ordered envelopes of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockData {
    /// Envelopes in admission order.
    pub envelopes: Vec<Envelope>,
}

impl BlockData {
    /// Hash over every envelope's payload and signature, in order.
    pub fn hash(&self) -> Hash {
        let parts: Vec<&[u8]> = self
            .envelopes
            .iter()
            .flat_map(|env| [env.payload.as_slice(), env.signature.as_slice()])
            .collect();
        sha256_many(&parts)
    }
}

/// Per-block metadata slots; see [`metadata_index`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Slot contents.
    pub metadata: Vec<Vec<u8>>,
}

impl Default for BlockMetadata {
    fn default() -> Self {
        Self {
            metadata: vec![Vec::new(); metadata_index::COUNT],
        }
    }
}

/// A block: header, ordered envelopes, metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    /// Chain linkage.
    pub header: BlockHeader,
    /// Ordered envelopes.
    pub data: BlockData,
    /// Metadata slots.
    pub metadata: BlockMetadata,
}

impl Block {
    /// Build a block over `envelopes`, computing the data hash.
    pub fn new(number: u64, previous_hash: Hash, envelopes: Vec<Envelope>) -> Self {
        let data = BlockData { envelopes };
        Self {
            header: BlockHeader {
                number,
                previous_hash,
                data_hash: data.hash(),
            },
            data,
            metadata: BlockMetadata::default(),
        }
    }

    /// Number of envelopes in the block.
    pub fn len(&self) -> usize {
        self.data.envelopes.len()
    }

    /// Whether the block carries no envelopes.
    pub fn is_empty(&self) -> bool {
        self.data.envelopes.is_empty()
    }
}
