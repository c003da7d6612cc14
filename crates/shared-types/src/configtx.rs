//! # Configuration Transactions
//!
//! Data carried by CONFIG_UPDATE and CONFIG payloads.
//!
//! A `ConfigUpdate` names the channel it targets and the values it writes.
//! Applying it to a channel's current `Config` yields a `ConfigEnvelope`
//! holding the full next configuration plus the update that produced it.

use crate::entities::Envelope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A signature over a config update by an admin of the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSignature {
    /// Marshalled signature header of the signer.
    pub signature_header: Vec<u8>,
    /// Signature over the signature header and the update bytes.
    pub signature: Vec<u8>,
}

/// Proposed changes to a channel's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    /// Channel the update applies to.
    pub channel_id: String,
    /// Values that must hold before the update applies (key → expected value).
    pub read_set: BTreeMap<String, Vec<u8>>,
    /// Values written by the update.
    pub write_set: BTreeMap<String, Vec<u8>>,
}

/// Data of a CONFIG_UPDATE payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigUpdateEnvelope {
    /// Marshalled [`ConfigUpdate`].
    pub config_update: Vec<u8>,
    /// Admin signatures over the update.
    pub signatures: Vec<ConfigSignature>,
}

/// A complete channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Configuration sequence number.
    pub sequence: u64,
    /// Configuration values.
    pub values: BTreeMap<String, Vec<u8>>,
}

/// Data of a CONFIG payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigEnvelope {
    /// The configuration in force after this transaction.
    pub config: Config,
    /// The CONFIG_UPDATE envelope that produced it.
    pub last_update: Option<Envelope>,
}
