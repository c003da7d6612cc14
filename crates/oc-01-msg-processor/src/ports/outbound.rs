//! Outbound Ports (Driven Ports / SPI)
//!
//! Configuration, policy and signing are external collaborators; the
//! processors reach them only through these traits.

use shared_crypto::LocalSigner;
use shared_types::{ConfigEnvelope, Envelope};
use std::sync::Arc;

/// A channel's configuration manager.
///
/// Proposing an update never changes the manager; it only computes the
/// configuration the update would produce.
pub trait ConfigManager: Send + Sync {
    /// Channel this manager configures.
    fn chain_id(&self) -> String;

    /// Current configuration sequence.
    fn sequence(&self) -> u64;

    /// Validate a CONFIG_UPDATE envelope against the current configuration
    /// and compute the resulting config envelope.
    fn propose_config_update(&self, env: &Envelope) -> Result<ConfigEnvelope, String>;
}

/// Resources a standard channel processor validates against.
pub trait StandardChannelSupport: Send + Sync {
    /// Channel ID.
    fn chain_id(&self) -> String;

    /// Current configuration sequence.
    fn sequence(&self) -> u64;

    /// Signer used for envelopes minted by the orderer.
    fn signer(&self) -> Arc<dyn LocalSigner>;

    /// Largest envelope, in bytes, the channel accepts.
    fn absolute_max_bytes(&self) -> usize;

    /// Check the envelope against the channel's writers policy.
    ///
    /// This covers creator signature validation.
    fn evaluate_writers(&self, env: &Envelope) -> Result<(), String>;

    /// Propose a config update against the channel's config manager.
    fn propose_config_update(&self, env: &Envelope) -> Result<ConfigEnvelope, String>;
}

/// Resources only the system channel has.
pub trait SystemChannelSupport: Send + Sync {
    /// Create a fresh config manager for the channel named in a
    /// CONFIG_UPDATE, seeded from the channel-creation template.
    fn new_channel_config(&self, env: &Envelope) -> Result<Box<dyn ConfigManager>, String>;
}

/// Mock implementations for testing
#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use shared_crypto::Ed25519Signer;
    use shared_types::Config;

    /// Configurable standard channel support
    pub struct MockStandardSupport {
        pub chain_id: String,
        pub sequence: u64,
        pub signer: Arc<dyn LocalSigner>,
        pub absolute_max_bytes: usize,
        pub writers_error: Option<String>,
        pub non_writers: Vec<Vec<u8>>,
        pub propose_error: Option<String>,
        pub proposed: Mutex<Vec<Envelope>>,
    }

    impl MockStandardSupport {
        pub fn new(chain_id: &str, sequence: u64) -> Self {
            Self {
                chain_id: chain_id.to_string(),
                sequence,
                signer: Arc::new(Ed25519Signer::from_seed([9u8; 32])),
                absolute_max_bytes: 10 * 1024 * 1024,
                writers_error: None,
                non_writers: Vec::new(),
                propose_error: None,
                proposed: Mutex::new(Vec::new()),
            }
        }
    }

    impl StandardChannelSupport for MockStandardSupport {
        fn chain_id(&self) -> String {
            self.chain_id.clone()
        }

        fn sequence(&self) -> u64 {
            self.sequence
        }

        fn signer(&self) -> Arc<dyn LocalSigner> {
            Arc::clone(&self.signer)
        }

        fn absolute_max_bytes(&self) -> usize {
            self.absolute_max_bytes
        }

        fn evaluate_writers(&self, env: &Envelope) -> Result<(), String> {
            if let Some(reason) = &self.writers_error {
                return Err(reason.clone());
            }
            let creator = env
                .payload()
                .and_then(|payload| payload.signature_header())
                .map_err(|e| e.to_string())?
                .creator;
            if self.non_writers.contains(&creator) {
                return Err("creator is not a writer".to_string());
            }
            Ok(())
        }

        fn propose_config_update(&self, env: &Envelope) -> Result<ConfigEnvelope, String> {
            if let Some(reason) = &self.propose_error {
                return Err(reason.clone());
            }
            self.proposed.lock().push(env.clone());
            Ok(ConfigEnvelope {
                config: Config {
                    sequence: self.sequence + 1,
                    ..Default::default()
                },
                last_update: Some(env.clone()),
            })
        }
    }

    /// Config manager for a freshly created channel
    pub struct MockConfigManager {
        pub chain_id: String,
        pub propose_error: Option<String>,
    }

    impl ConfigManager for MockConfigManager {
        fn chain_id(&self) -> String {
            self.chain_id.clone()
        }

        fn sequence(&self) -> u64 {
            0
        }

        fn propose_config_update(&self, env: &Envelope) -> Result<ConfigEnvelope, String> {
            if let Some(reason) = &self.propose_error {
                return Err(reason.clone());
            }
            Ok(ConfigEnvelope {
                config: Config {
                    sequence: 1,
                    ..Default::default()
                },
                last_update: Some(env.clone()),
            })
        }
    }

    /// System channel support handing out [`MockConfigManager`]s
    #[derive(Default)]
    pub struct MockSystemSupport {
        pub template_error: Option<String>,
        pub propose_error: Option<String>,
        pub created: Mutex<Vec<String>>,
    }

    impl SystemChannelSupport for MockSystemSupport {
        fn new_channel_config(&self, env: &Envelope) -> Result<Box<dyn ConfigManager>, String> {
            if let Some(reason) = &self.template_error {
                return Err(reason.clone());
            }
            let chain_id = env.channel_id().map_err(|e| e.to_string())?;
            self.created.lock().push(chain_id.clone());
            Ok(Box::new(MockConfigManager {
                chain_id,
                propose_error: self.propose_error.clone(),
            }))
        }
    }
}
