//! Inbound Ports (Driving Ports / API)
//!
//! What the hosting framework sees of a consensus implementation.

use crate::domain::errors::ChainError;
use crate::domain::signal::HaltSignal;
use crate::ports::outbound::ConsenterSupport;
use async_trait::async_trait;
use shared_types::Envelope;
use std::sync::Arc;

/// Builds a chain for each channel.
pub trait Consenter: Send + Sync {
    /// Create the chain for `support`.
    ///
    /// `metadata` is the consenter metadata of the channel's last block.
    fn handle_chain(
        &self,
        support: Box<dyn ConsenterSupport>,
        metadata: Option<&[u8]>,
    ) -> Result<Arc<dyn Chain>, ChainError>;
}

/// A channel's ordering pipeline.
#[async_trait]
pub trait Chain: Send + Sync {
    /// Admit a validated normal message.
    ///
    /// Completes once the sequencing task has taken the message; the message
    /// is the next one it processes. Fails once the chain has halted.
    async fn order(&self, env: Envelope, config_seq: u64) -> Result<(), ChainError>;

    /// Admit the CONFIG (or ORDERER_TRANSACTION) envelope produced from
    /// `config_update`.
    async fn configure(
        &self,
        config_update: Envelope,
        config: Envelope,
        config_seq: u64,
    ) -> Result<(), ChainError>;

    /// Begin sequencing.
    fn start(&self);

    /// Stop sequencing. Safe to call any number of times from anywhere.
    fn halt(&self);

    /// Signal that becomes ready when the chain has halted.
    fn errored(&self) -> HaltSignal;
}
