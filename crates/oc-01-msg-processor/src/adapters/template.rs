//! Channel-creation template
//!
//! Seeds the configuration of every channel created through the system
//! channel.

use crate::adapters::config_manager::InMemoryConfigManager;
use crate::ports::outbound::{ConfigManager, SystemChannelSupport};
use shared_types::{
    unmarshal, unmarshal_envelope_of_type, Config, ConfigUpdate, ConfigUpdateEnvelope, Envelope,
    HeaderType,
};
use std::collections::BTreeMap;

/// Longest channel ID accepted
pub const MAX_CHANNEL_ID_LEN: usize = 249;

/// Check a channel ID: lowercase ASCII letters, digits, `.` and `-`,
/// starting with a letter.
pub fn validate_channel_id(channel_id: &str) -> Result<(), String> {
    if channel_id.is_empty() {
        return Err("channel ID is empty".to_string());
    }
    if channel_id.len() > MAX_CHANNEL_ID_LEN {
        return Err(format!(
            "channel ID is {} characters, maximum is {MAX_CHANNEL_ID_LEN}",
            channel_id.len()
        ));
    }
    if !channel_id.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(format!("channel ID '{channel_id}' must start with a letter"));
    }
    if let Some(bad) = channel_id
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.' || *c == '-'))
    {
        return Err(format!("channel ID '{channel_id}' contains '{bad}'"));
    }
    Ok(())
}

/// Template every new channel's configuration starts from
#[derive(Debug, Clone, Default)]
pub struct ChannelTemplate {
    values: BTreeMap<String, Vec<u8>>,
}

impl ChannelTemplate {
    pub fn new(values: BTreeMap<String, Vec<u8>>) -> Self {
        Self { values }
    }

    /// Configuration a new channel starts with, before its creation update
    pub fn base_config(&self) -> Config {
        Config {
            sequence: 0,
            values: self.values.clone(),
        }
    }
}

impl SystemChannelSupport for ChannelTemplate {
    fn new_channel_config(&self, env: &Envelope) -> Result<Box<dyn ConfigManager>, String> {
        let (chdr, update_env): (_, ConfigUpdateEnvelope) =
            unmarshal_envelope_of_type(env, HeaderType::ConfigUpdate).map_err(|e| e.to_string())?;
        let update: ConfigUpdate =
            unmarshal(&update_env.config_update).map_err(|e| e.to_string())?;

        validate_channel_id(&chdr.channel_id)?;
        if update.channel_id != chdr.channel_id {
            return Err(format!(
                "update names channel {} but is addressed to {}",
                update.channel_id, chdr.channel_id
            ));
        }

        Ok(Box::new(InMemoryConfigManager::new(
            chdr.channel_id,
            self.base_config(),
        )))
    }
}
