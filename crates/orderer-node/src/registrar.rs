//! # Channel Registrar
//!
//! Owns every channel the node orders for and keeps them in step with the
//! system channel's block stream.
//!
//! ## Config block handling
//!
//! | Block content | Reaction |
//! |---------------|----------|
//! | CONFIG | commit the new configuration to the channel's config manager |
//! | ORDERER_TRANSACTION (system channel) | materialise the embedded CONFIG as a new channel |
//!
//! Chains hold the registrar only weakly, so dropping the registrar tears
//! every chain down.

use crate::config::NodeConfig;
use anyhow::{Context, Result};
use oc_01_msg_processor::{
    ChannelResources, ChannelTemplate, InMemoryConfigManager, Processor, ProcessorConfig, Rule,
    RuleSet, StandardChannel, SystemChannel,
};
use oc_02_solo::{
    Chain, ChainSupport, ConfigBlockObserver, Consenter, InMemoryLedger, SoloConfig,
    SoloConsenter,
};
use parking_lot::RwLock;
use quantum_telemetry::{metric_inc, subsystem_span, CHANNELS_CREATED};
use shared_crypto::LocalSigner;
use shared_types::{
    create_signed_envelope, unmarshal_envelope_of_type, Block, Config, ConfigEnvelope, Envelope,
    HeaderType,
};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Everything the node holds for one channel
#[derive(Clone)]
pub struct ChannelHandle {
    pub processor: Arc<dyn Processor>,
    pub chain: Arc<dyn Chain>,
    pub ledger: InMemoryLedger,
    pub config_manager: Arc<InMemoryConfigManager>,
}

/// Registry of live channels
pub struct ChannelRegistrar {
    system_channel_id: String,
    signer: Arc<dyn LocalSigner>,
    processor_config: ProcessorConfig,
    batch_config: SoloConfig,
    template: Arc<ChannelTemplate>,
    writers: Option<Vec<Vec<u8>>>,
    max_channels: usize,
    consenter: SoloConsenter,
    observer: Arc<dyn ConfigBlockObserver>,
    self_ref: Weak<ChannelRegistrar>,
    channels: RwLock<HashMap<String, ChannelHandle>>,
}

impl ChannelRegistrar {
    /// Create the registrar and bootstrap the system channel.
    ///
    /// Chains are not started; see [`ChannelRegistrar::start_all`].
    pub fn new(config: &NodeConfig) -> Result<Arc<Self>> {
        let signer: Arc<dyn LocalSigner> = Arc::new(config.signer()?);

        // The orderer signs every CONFIG and ORDERER_TRANSACTION it orders,
        // so a restricted writer set must admit it.
        let writers = match config.writer_identities()? {
            writers if writers.is_empty() => None,
            mut writers => {
                writers.push(signer.identity());
                Some(writers)
            }
        };

        let registrar = Arc::new_cyclic(|self_ref: &Weak<Self>| Self {
            system_channel_id: config.system_channel_id.clone(),
            signer,
            processor_config: config.processor.clone(),
            batch_config: config.batch.clone(),
            template: Arc::new(ChannelTemplate::new(config.template_values())),
            writers,
            max_channels: config.max_channels,
            consenter: SoloConsenter::new(),
            observer: Arc::new(RegistrarObserver {
                registrar: self_ref.clone(),
            }),
            self_ref: self_ref.clone(),
            channels: RwLock::new(HashMap::new()),
        });

        registrar.bootstrap_system_channel()?;
        Ok(registrar)
    }

    pub fn system_channel_id(&self) -> &str {
        &self.system_channel_id
    }

    /// The orderer's signing identity
    pub fn signer(&self) -> Arc<dyn LocalSigner> {
        Arc::clone(&self.signer)
    }

    pub fn get(&self, channel_id: &str) -> Option<ChannelHandle> {
        self.channels.read().get(channel_id).cloned()
    }

    pub fn has_channel(&self, channel_id: &str) -> bool {
        self.channels.read().contains_key(channel_id)
    }

    /// Handle of the system channel
    pub fn system_channel(&self) -> Result<ChannelHandle> {
        self.get(&self.system_channel_id)
            .context("System channel is not registered")
    }

    /// IDs of every channel, sorted
    pub fn channel_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.channels.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Channels created through the system channel
    pub fn created_channel_count(&self) -> usize {
        self.channels.read().len().saturating_sub(1)
    }

    /// Start every registered chain
    pub fn start_all(&self) {
        for handle in self.channels.read().values() {
            handle.chain.start();
        }
    }

    /// Halt every registered chain
    pub fn halt_all(&self) {
        for (channel_id, handle) in self.channels.read().iter() {
            debug!(channel = %channel_id, "Halting chain");
            handle.chain.halt();
        }
    }

    fn bootstrap_system_channel(&self) -> Result<()> {
        let channel_id = self.system_channel_id.clone();
        let genesis = ConfigEnvelope {
            config: Config {
                sequence: 0,
                values: self.template.base_config().values,
            },
            last_update: None,
        };
        let genesis_env = create_signed_envelope(
            HeaderType::Config,
            &channel_id,
            self.signer.as_ref(),
            &genesis,
            self.processor_config.msg_version,
            self.processor_config.epoch,
        )
        .context("Failed to sign system channel genesis config")?;

        let ledger = InMemoryLedger::with_genesis(&channel_id, genesis_env)
            .context("Failed to write system channel genesis block")?;
        let config_manager = Arc::new(InMemoryConfigManager::new(&channel_id, genesis.config));
        let resources = self.resources(&config_manager);

        let filters = RuleSet::standard(resources.clone()).with_rule(Box::new(
            SystemChannelFilter::new(self.self_ref.clone(), self.max_channels),
        ));
        let standard = StandardChannel::with_config(resources, self.processor_config.clone())
            .with_span(subsystem_span!("msgprocessor", channel = %channel_id))
            .with_filters(filters);
        let processor: Arc<dyn Processor> = Arc::new(SystemChannel::from_standard(
            standard,
            self.template.clone(),
        ));

        let handle = self.assemble(&channel_id, processor, ledger, config_manager)?;
        self.channels.write().insert(channel_id.clone(), handle);
        info!(channel = %channel_id, "System channel bootstrapped");
        Ok(())
    }

    fn resources(&self, config_manager: &Arc<InMemoryConfigManager>) -> Arc<ChannelResources> {
        let resources = ChannelResources::new(
            Arc::clone(config_manager),
            Arc::clone(&self.signer),
            &self.processor_config,
        );
        Arc::new(match &self.writers {
            Some(writers) => resources.with_writers(writers.iter().cloned()),
            None => resources,
        })
    }

    /// Wire a processor and ledger to a new solo chain
    fn assemble(
        &self,
        channel_id: &str,
        processor: Arc<dyn Processor>,
        ledger: InMemoryLedger,
        config_manager: Arc<InMemoryConfigManager>,
    ) -> Result<ChannelHandle> {
        let support = ChainSupport::new(Arc::clone(&processor), ledger.clone(), &self.batch_config)
            .with_observer(Arc::clone(&self.observer));
        let chain = self
            .consenter
            .handle_chain(Box::new(support), None)
            .with_context(|| format!("Failed to create chain for {channel_id}"))?;

        Ok(ChannelHandle {
            processor,
            chain,
            ledger,
            config_manager,
        })
    }

    fn on_config_block(&self, channel_id: &str, block: &Block) -> Result<(), String> {
        let env = block
            .data
            .envelopes
            .first()
            .ok_or_else(|| "config block is empty".to_string())?;
        let header_type = env
            .channel_header()
            .and_then(|chdr| chdr.header_type())
            .map_err(|e| e.to_string())?;

        match header_type {
            HeaderType::Config => self.commit_config(channel_id, env),
            HeaderType::OrdererTransaction if channel_id == self.system_channel_id => {
                self.create_channel(env)
            }
            other => Err(format!("unexpected {other:?} in config block")),
        }
    }

    fn commit_config(&self, channel_id: &str, env: &Envelope) -> Result<(), String> {
        let (_, config_env): (_, ConfigEnvelope) =
            unmarshal_envelope_of_type(env, HeaderType::Config).map_err(|e| e.to_string())?;
        let handle = self
            .get(channel_id)
            .ok_or_else(|| format!("channel {channel_id} is not registered"))?;

        handle.config_manager.commit(&config_env)?;
        info!(
            channel = %channel_id,
            sequence = config_env.config.sequence,
            "Channel configuration updated"
        );
        Ok(())
    }

    fn create_channel(&self, orderer_tx: &Envelope) -> Result<(), String> {
        let (channel_id, inner, genesis) = unwrap_orderer_transaction(orderer_tx)?;

        if self.has_channel(&channel_id) {
            return Err(format!("channel {channel_id} already exists"));
        }

        let ledger = InMemoryLedger::with_genesis(&channel_id, inner).map_err(|e| e.to_string())?;
        let config_manager = Arc::new(InMemoryConfigManager::new(&channel_id, genesis.config));
        let resources = self.resources(&config_manager);
        let processor: Arc<dyn Processor> = Arc::new(
            StandardChannel::with_config(resources, self.processor_config.clone())
                .with_span(subsystem_span!("msgprocessor", channel = %channel_id)),
        );

        let handle = self
            .assemble(&channel_id, processor, ledger, config_manager)
            .map_err(|e| e.to_string())?;
        handle.chain.start();
        self.channels.write().insert(channel_id.clone(), handle);

        metric_inc!(CHANNELS_CREATED, &[self.system_channel_id.as_str()]);
        info!(channel = %channel_id, "Channel created");
        Ok(())
    }
}

/// Split an ORDERER_TRANSACTION into the new channel's ID, its CONFIG
/// envelope and the genesis configuration it carries.
fn unwrap_orderer_transaction(
    orderer_tx: &Envelope,
) -> Result<(String, Envelope, ConfigEnvelope), String> {
    let (_, inner): (_, Envelope) =
        unmarshal_envelope_of_type(orderer_tx, HeaderType::OrdererTransaction)
            .map_err(|e| e.to_string())?;
    let (chdr, genesis): (_, ConfigEnvelope) =
        unmarshal_envelope_of_type(&inner, HeaderType::Config).map_err(|e| e.to_string())?;
    Ok((chdr.channel_id, inner, genesis))
}

struct RegistrarObserver {
    registrar: Weak<ChannelRegistrar>,
}

impl ConfigBlockObserver for RegistrarObserver {
    fn config_block_written(&self, channel_id: &str, block: &Block) -> Result<(), String> {
        let registrar = self
            .registrar
            .upgrade()
            .ok_or_else(|| "registrar is shut down".to_string())?;
        registrar.on_config_block(channel_id, block)
    }
}

/// Rejects channel creation transactions for channels that already exist,
/// or beyond the channel limit
pub struct SystemChannelFilter {
    registrar: Weak<ChannelRegistrar>,
    max_channels: usize,
}

impl SystemChannelFilter {
    pub fn new(registrar: Weak<ChannelRegistrar>, max_channels: usize) -> Self {
        Self {
            registrar,
            max_channels,
        }
    }
}

impl Rule for SystemChannelFilter {
    fn name(&self) -> &'static str {
        "SystemChannelFilter"
    }

    fn apply(&self, env: &Envelope) -> Result<(), String> {
        let header_type = env
            .channel_header()
            .map_err(|e| e.to_string())?
            .header_type;
        if header_type != HeaderType::OrdererTransaction.code() {
            return Ok(());
        }

        let (channel_id, _, _) = unwrap_orderer_transaction(env)?;
        let registrar = self
            .registrar
            .upgrade()
            .ok_or_else(|| "registrar is shut down".to_string())?;

        if registrar.has_channel(&channel_id) {
            return Err(format!("channel {channel_id} already exists"));
        }
        if self.max_channels > 0 && registrar.created_channel_count() >= self.max_channels {
            warn!(
                channel = %channel_id,
                max_channels = self.max_channels,
                "Channel creation refused, limit reached"
            );
            return Err(format!(
                "channel creation would exceed maximum channel count {}",
                self.max_channels
            ));
        }
        Ok(())
    }
}
