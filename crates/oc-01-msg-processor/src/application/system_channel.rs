//! System Channel Processor
//!
//! The system channel is the catch-all for messages addressed to channels
//! that do not exist yet. Config updates for unknown channels are channel
//! creation requests; everything else for an unknown channel is rejected.
//!
//! ## Channel creation output
//!
//! ```text
//! Envelope(ORDERER_TRANSACTION, channel = <system>)
//!   └── Envelope(CONFIG, channel = <new channel>)
//!         └── ConfigEnvelope (genesis config of the new channel)
//! ```
//!
//! Channel creation is thereby an ordered entry in the system channel's own
//! block stream; consumers materialize the embedded CONFIG as a new ledger.

use crate::application::standard_channel::StandardChannel;
use crate::domain::classification::Classification;
use crate::domain::errors::ProcessorError;
use crate::ports::inbound::Processor;
use crate::ports::outbound::{StandardChannelSupport, SystemChannelSupport};
use shared_types::{create_signed_envelope, ChannelHeader, Envelope, HeaderType};
use std::sync::Arc;
use tracing::{info, warn};

/// Processor for the system channel
///
/// Forwards to the wrapped [`StandardChannel`] except where a message
/// targets another channel.
pub struct SystemChannel {
    standard: StandardChannel,
    system_support: Arc<dyn SystemChannelSupport>,
}

impl SystemChannel {
    /// Create a system channel processor
    pub fn new(
        support: Arc<dyn StandardChannelSupport>,
        system_support: Arc<dyn SystemChannelSupport>,
    ) -> Self {
        Self::from_standard(StandardChannel::new(support), system_support)
    }

    /// Wrap an already configured standard processor
    pub fn from_standard(
        standard: StandardChannel,
        system_support: Arc<dyn SystemChannelSupport>,
    ) -> Self {
        Self {
            standard,
            system_support,
        }
    }

    /// The system channel ID, fixed by the wrapped support
    pub fn system_channel_id(&self) -> String {
        self.standard.support().chain_id()
    }

    fn target_channel(&self, env: &Envelope) -> Result<String, ProcessorError> {
        Ok(env.channel_id()?)
    }

    /// Build the doubly wrapped channel creation transaction.
    fn create_channel(
        &self,
        channel_id: &str,
        env: &Envelope,
    ) -> Result<(Envelope, u64), String> {
        // The request itself is held to the system channel's writers
        self.standard.filters().apply(env).map_err(|e| e.to_string())?;

        let support = self.standard.support();
        let stamps = self.standard.config();
        let signer = support.signer();

        let manager = self.system_support.new_channel_config(env)?;
        if manager.chain_id() != channel_id {
            return Err(format!(
                "template produced config for {} instead of {}",
                manager.chain_id(),
                channel_id
            ));
        }

        let genesis_config = manager.propose_config_update(env)?;

        let new_channel_config = create_signed_envelope(
            HeaderType::Config,
            channel_id,
            signer.as_ref(),
            &genesis_config,
            stamps.msg_version,
            stamps.epoch,
        )
        .map_err(|e| e.to_string())?;

        let orderer_transaction = create_signed_envelope(
            HeaderType::OrdererTransaction,
            &support.chain_id(),
            signer.as_ref(),
            &new_channel_config,
            stamps.msg_version,
            stamps.epoch,
        )
        .map_err(|e| e.to_string())?;

        // The wrapped transaction is what the system channel orders
        self.standard
            .filters()
            .apply(&orderer_transaction)
            .map_err(|e| e.to_string())?;

        // Ordered on the system channel, so validated as of its sequence
        Ok((orderer_transaction, support.sequence()))
    }
}

impl Processor for SystemChannel {
    fn classify_msg(&self, chdr: &ChannelHeader) -> Result<Classification, ProcessorError> {
        self.standard.classify_msg(chdr)
    }

    fn process_normal_msg(&self, env: &Envelope) -> Result<u64, ProcessorError> {
        let channel_id = self.target_channel(env)?;

        // Standard processors are looked up by channel ID and never check it.
        // The system channel is reached for any unknown channel, so it must.
        if channel_id != self.system_channel_id() {
            return Err(ProcessorError::ChannelNotFound { channel_id });
        }

        self.standard.process_normal_msg(env)
    }

    fn process_config_update_msg(
        &self,
        env: &Envelope,
    ) -> Result<(Envelope, u64), ProcessorError> {
        let channel_id = self.target_channel(env)?;

        if channel_id == self.system_channel_id() {
            return self.standard.process_config_update_msg(env);
        }

        let _entered = self.standard.span().enter();
        info!(channel = %channel_id, "[msgprocessor] Processing channel creation request");

        self.create_channel(&channel_id, env).map_err(|reason| {
            warn!(channel = %channel_id, %reason, "[msgprocessor] Channel creation failed");
            ProcessorError::ChannelCreationFailure { channel_id, reason }
        })
    }
}
