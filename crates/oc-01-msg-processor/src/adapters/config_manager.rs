//! In-memory configuration manager
//!
//! Holds a channel's current [`Config`]. Proposals are pure; only
//! [`InMemoryConfigManager::commit`] advances the configuration, which the
//! hosting node does after the CONFIG block is written.

use crate::ports::outbound::ConfigManager;
use parking_lot::RwLock;
use shared_types::{
    unmarshal, unmarshal_envelope_of_type, Config, ConfigEnvelope, ConfigUpdate,
    ConfigUpdateEnvelope, Envelope, HeaderType,
};
use tracing::debug;

/// Config manager backed by a lock-protected [`Config`]
pub struct InMemoryConfigManager {
    chain_id: String,
    config: RwLock<Config>,
}

impl InMemoryConfigManager {
    pub fn new(chain_id: impl Into<String>, config: Config) -> Self {
        Self {
            chain_id: chain_id.into(),
            config: RwLock::new(config),
        }
    }

    /// Snapshot of the current configuration
    pub fn current(&self) -> Config {
        self.config.read().clone()
    }

    /// Install the configuration carried by a written CONFIG block.
    ///
    /// The committed sequence must be exactly one ahead of the current one.
    pub fn commit(&self, config_env: &ConfigEnvelope) -> Result<(), String> {
        let mut config = self.config.write();
        let expected = config.sequence + 1;
        if config_env.config.sequence != expected {
            return Err(format!(
                "config sequence {} does not follow {}",
                config_env.config.sequence, config.sequence
            ));
        }
        *config = config_env.config.clone();
        debug!(channel = %self.chain_id, sequence = expected, "[msgprocessor] Config committed");
        Ok(())
    }
}

impl ConfigManager for InMemoryConfigManager {
    fn chain_id(&self) -> String {
        self.chain_id.clone()
    }

    fn sequence(&self) -> u64 {
        self.config.read().sequence
    }

    fn propose_config_update(&self, env: &Envelope) -> Result<ConfigEnvelope, String> {
        let (_, update_env): (_, ConfigUpdateEnvelope) =
            unmarshal_envelope_of_type(env, HeaderType::ConfigUpdate).map_err(|e| e.to_string())?;
        let update: ConfigUpdate =
            unmarshal(&update_env.config_update).map_err(|e| e.to_string())?;

        if update.channel_id != self.chain_id {
            return Err(format!(
                "update is for channel {} but this is channel {}",
                update.channel_id, self.chain_id
            ));
        }
        if update.write_set.is_empty() {
            return Err("update writes nothing".to_string());
        }

        let current = self.config.read();
        for (key, expected) in &update.read_set {
            if current.values.get(key) != Some(expected) {
                return Err(format!("read set is stale at key {key}"));
            }
        }

        let mut values = current.values.clone();
        values.extend(update.write_set);

        Ok(ConfigEnvelope {
            config: Config {
                sequence: current.sequence + 1,
                values,
            },
            last_update: Some(env.clone()),
        })
    }
}
