//! # Broadcast Dispatcher
//!
//! Entry point for submitted envelopes. Routes each one to the processor
//! and chain of the channel it names, falling back to the system channel
//! when that channel does not exist.
//!
//! ```text
//! Envelope ──→ channel header ──→ registrar lookup ──→ classify
//!                                      │ (unknown)         │
//!                                      ↓                   ├─ NormalMsg ──→ process_normal_msg ──→ order
//!                               system channel             └─ ConfigUpdateMsg ──→ process_config_update_msg ──→ configure
//! ```

use crate::registrar::{ChannelHandle, ChannelRegistrar};
use oc_01_msg_processor::{Classification, Processor, ProcessorError};
use oc_02_solo::{Chain, ChainError};
use quantum_telemetry::{metric_inc, ENVELOPES_DISCARDED};
use shared_types::{Envelope, HeaderType};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Why a broadcast was refused
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Config-class messages may only be submitted as CONFIG_UPDATE
    #[error("message of header type {0} cannot be broadcast, submit a CONFIG_UPDATE instead")]
    UnsupportedType(i32),

    #[error("system channel is not available")]
    SystemChannelUnavailable,
}

impl BroadcastError {
    /// HTTP-style status for the submitter
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Processor(ProcessorError::ValidationFailure { .. }) => 403,
            Self::Processor(ProcessorError::ChannelNotFound { .. }) => 404,
            Self::Processor(_) | Self::UnsupportedType(_) => 400,
            Self::Chain(ChainError::ChainHalted) | Self::SystemChannelUnavailable => 503,
            Self::Chain(_) => 500,
        }
    }

    /// Short label for metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Processor(e) => e.label(),
            Self::Chain(_) => "halted",
            Self::UnsupportedType(_) => "unsupported_type",
            Self::SystemChannelUnavailable => "unavailable",
        }
    }
}

/// Routes broadcast envelopes to their channel
#[derive(Clone)]
pub struct BroadcastDispatcher {
    registrar: Arc<ChannelRegistrar>,
}

impl BroadcastDispatcher {
    pub fn new(registrar: Arc<ChannelRegistrar>) -> Self {
        Self { registrar }
    }

    /// Validate `env` and hand it to its channel's chain.
    ///
    /// Returns once the chain has accepted the message, not once it is in
    /// a block.
    pub async fn broadcast(&self, env: Envelope) -> Result<(), BroadcastError> {
        let channel = env.channel_id().unwrap_or_default();

        let result = self.dispatch(env).await;
        if let Err(e) = &result {
            debug!(channel = %channel, status = e.status_code(), error = %e, "Broadcast refused");
            metric_inc!(ENVELOPES_DISCARDED, &[channel.as_str(), e.label()]);
        }
        result
    }

    async fn dispatch(&self, env: Envelope) -> Result<(), BroadcastError> {
        let chdr = env.channel_header().map_err(ProcessorError::from)?;
        let handle = self.route(&chdr.channel_id)?;

        match handle.processor.classify_msg(&chdr)? {
            Classification::NormalMsg => {
                let config_seq = handle.processor.process_normal_msg(&env)?;
                handle.chain.order(env, config_seq).await?;
            }
            Classification::ConfigUpdateMsg => {
                if chdr.header_type != HeaderType::ConfigUpdate.code() {
                    return Err(BroadcastError::UnsupportedType(chdr.header_type));
                }
                let (config, config_seq) = handle.processor.process_config_update_msg(&env)?;
                handle.chain.configure(env, config, config_seq).await?;
            }
        }
        Ok(())
    }

    fn route(&self, channel_id: &str) -> Result<ChannelHandle, BroadcastError> {
        self.registrar
            .get(channel_id)
            .or_else(|| self.registrar.get(self.registrar.system_channel_id()))
            .ok_or(BroadcastError::SystemChannelUnavailable)
    }
}
