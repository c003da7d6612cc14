//! Channel resources
//!
//! Reference [`StandardChannelSupport`] over an [`InMemoryConfigManager`].
//! The writers policy is: the creator signature must verify, and if a
//! writer set is configured the creator must be a member of it.

use crate::adapters::config_manager::InMemoryConfigManager;
use crate::config::ProcessorConfig;
use crate::ports::outbound::{ConfigManager, StandardChannelSupport};
use shared_crypto::{Ed25519Signer, LocalSigner};
use shared_types::{ConfigEnvelope, Envelope};
use std::collections::HashSet;
use std::sync::Arc;

/// Everything a standard channel processor needs for one channel
pub struct ChannelResources {
    config_manager: Arc<InMemoryConfigManager>,
    signer: Arc<dyn LocalSigner>,
    absolute_max_bytes: usize,
    writers: Option<HashSet<Vec<u8>>>,
}

impl ChannelResources {
    pub fn new(
        config_manager: Arc<InMemoryConfigManager>,
        signer: Arc<dyn LocalSigner>,
        config: &ProcessorConfig,
    ) -> Self {
        Self {
            config_manager,
            signer,
            absolute_max_bytes: config.absolute_max_bytes,
            writers: None,
        }
    }

    /// Restrict writing to the given creator identities
    pub fn with_writers(mut self, writers: impl IntoIterator<Item = Vec<u8>>) -> Self {
        self.writers = Some(writers.into_iter().collect());
        self
    }

    /// The channel's config manager
    pub fn config_manager(&self) -> &Arc<InMemoryConfigManager> {
        &self.config_manager
    }
}

impl StandardChannelSupport for ChannelResources {
    fn chain_id(&self) -> String {
        self.config_manager.chain_id()
    }

    fn sequence(&self) -> u64 {
        self.config_manager.sequence()
    }

    fn signer(&self) -> Arc<dyn LocalSigner> {
        Arc::clone(&self.signer)
    }

    fn absolute_max_bytes(&self) -> usize {
        self.absolute_max_bytes
    }

    fn evaluate_writers(&self, env: &Envelope) -> Result<(), String> {
        let creator = env
            .payload()
            .and_then(|payload| payload.signature_header())
            .map_err(|e| e.to_string())?
            .creator;

        Ed25519Signer::verify(&creator, &env.payload, &env.signature)
            .map_err(|e| format!("creator signature invalid: {e}"))?;

        match &self.writers {
            Some(writers) if !writers.contains(&creator) => {
                Err("creator is not a member of the writers set".to_string())
            }
            _ => Ok(()),
        }
    }

    fn propose_config_update(&self, env: &Envelope) -> Result<ConfigEnvelope, String> {
        self.config_manager.propose_config_update(env)
    }
}
