//! # Node Configuration
//!
//! Loaded from the JSON file named by `QC_ORDERER_CONFIG` (defaults when
//! unset), then overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `QC_SYSTEM_CHANNEL` | `system_channel_id` |
//! | `QC_BATCH_TIMEOUT_MS` | `batch.batch_timeout_ms` |
//! | `QC_MAX_MESSAGE_COUNT` | `batch.max_message_count` |
//! | `QC_SIGNER_SEED` | `signer_seed` |

use anyhow::{bail, Context, Result};
use oc_01_msg_processor::adapters::validate_channel_id;
use oc_01_msg_processor::ProcessorConfig;
use oc_02_solo::SoloConfig;
use serde::{Deserialize, Serialize};
use shared_crypto::Ed25519Signer;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Orderer node configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    /// ID of the channel that creates all other channels
    pub system_channel_id: String,
    /// Envelope stamps and size limits for the message processors
    pub processor: ProcessorConfig,
    /// Batch cutting and timeout for every chain
    pub batch: SoloConfig,
    /// Hex-encoded 32-byte seed of the orderer's signing key (random if unset)
    pub signer_seed: Option<String>,
    /// Values every created channel's configuration starts with
    pub channel_template: BTreeMap<String, String>,
    /// Hex-encoded identities allowed to write (anyone with a valid signature if empty)
    pub writers: Vec<String>,
    /// Most channels besides the system channel (0 = unlimited)
    pub max_channels: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            system_channel_id: "system".to_string(),
            processor: ProcessorConfig::default(),
            batch: SoloConfig::default(),
            signer_seed: None,
            channel_template: BTreeMap::new(),
            writers: Vec::new(),
            max_channels: 0,
        }
    }
}

impl NodeConfig {
    /// Load from `QC_ORDERER_CONFIG` and the environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("QC_ORDERER_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(channel) = std::env::var("QC_SYSTEM_CHANNEL") {
            self.system_channel_id = channel;
        }
        if let Ok(ms) = std::env::var("QC_BATCH_TIMEOUT_MS") {
            match ms.parse() {
                Ok(ms) => self.batch.batch_timeout_ms = ms,
                Err(_) => warn!("QC_BATCH_TIMEOUT_MS must be a number of milliseconds"),
            }
        }
        if let Ok(count) = std::env::var("QC_MAX_MESSAGE_COUNT") {
            match count.parse() {
                Ok(count) => self.batch.max_message_count = count,
                Err(_) => warn!("QC_MAX_MESSAGE_COUNT must be a positive number"),
            }
        }
        if let Ok(seed) = std::env::var("QC_SIGNER_SEED") {
            self.signer_seed = Some(seed);
        }
    }

    /// Reject configurations the node cannot run with
    pub fn validate(&self) -> Result<()> {
        if let Err(reason) = validate_channel_id(&self.system_channel_id) {
            bail!("Invalid system channel ID: {reason}");
        }
        self.batch
            .validate()
            .context("Invalid batch configuration")?;
        if self.processor.absolute_max_bytes == 0 {
            bail!("processor.absolute_max_bytes must be positive");
        }
        if self.batch.preferred_max_bytes as usize > self.processor.absolute_max_bytes {
            bail!(
                "batch.preferred_max_bytes {} exceeds processor.absolute_max_bytes {}",
                self.batch.preferred_max_bytes,
                self.processor.absolute_max_bytes
            );
        }
        if self.signer_seed.is_some() {
            self.signer()?;
        }
        self.writer_identities()?;
        Ok(())
    }

    /// The orderer's signing key
    pub fn signer(&self) -> Result<Ed25519Signer> {
        let Some(seed_hex) = &self.signer_seed else {
            warn!("No signer seed configured, using an ephemeral key");
            return Ok(Ed25519Signer::generate());
        };

        let bytes = hex::decode(seed_hex).context("signer_seed is not valid hex")?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("signer_seed must be 32 bytes (64 hex chars)"))?;
        Ok(Ed25519Signer::from_seed(seed))
    }

    /// Decoded writer identities
    pub fn writer_identities(&self) -> Result<Vec<Vec<u8>>> {
        self.writers
            .iter()
            .map(|writer| {
                hex::decode(writer).with_context(|| format!("writer {writer} is not valid hex"))
            })
            .collect()
    }

    /// Template values as bytes
    pub fn template_values(&self) -> BTreeMap<String, Vec<u8>> {
        self.channel_template
            .iter()
            .map(|(key, value)| (key.clone(), value.clone().into_bytes()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::LocalSigner;

    #[test]
    fn test_default_config_is_valid() {
        let config = NodeConfig::default();

        assert_eq!(config.system_channel_id, "system");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: NodeConfig =
            serde_json::from_str(r#"{"system_channel_id": "ordersys", "max_channels": 4}"#)
                .unwrap();

        assert_eq!(config.system_channel_id, "ordersys");
        assert_eq!(config.max_channels, 4);
        assert_eq!(config.batch, SoloConfig::default());
    }

    #[test]
    fn test_invalid_system_channel_rejected() {
        let config = NodeConfig {
            system_channel_id: "System".to_string(),
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preferred_size_above_message_limit_rejected() {
        let mut config = NodeConfig::default();
        config.processor.absolute_max_bytes = 1024;
        config.batch.preferred_max_bytes = 1025;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("preferred_max_bytes"));

        config.batch.preferred_max_bytes = 1024;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_signer_from_seed_is_stable() {
        let config = NodeConfig {
            signer_seed: Some("07".repeat(32)),
            ..Default::default()
        };

        let first = config.signer().unwrap();
        let second = config.signer().unwrap();
        assert_eq!(first.identity(), second.identity());
        assert_eq!(first.identity(), Ed25519Signer::from_seed([7u8; 32]).identity());
    }

    #[test]
    fn test_short_seed_rejected() {
        let config = NodeConfig {
            signer_seed: Some("0707".to_string()),
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_writer_rejected() {
        let config = NodeConfig {
            writers: vec!["not-hex".to_string()],
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_template_values_as_bytes() {
        let mut config = NodeConfig::default();
        config
            .channel_template
            .insert("Consortium".to_string(), "members".to_string());

        assert_eq!(
            config.template_values().get("Consortium"),
            Some(&b"members".to_vec())
        );
    }
}
