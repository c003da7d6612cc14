//! # Quantum-Chain Orderer Node
//!
//! Hosts the ordering service: one solo chain per channel, fed by the
//! message processors.
//!
//! ## Modular Structure
//!
//! - `config` - Node configuration (file + environment)
//! - `registrar` - Channel registry, system channel bootstrap, channel creation
//! - `dispatcher` - Broadcast routing by channel ID
//!
//! ## Channel Creation Flow
//!
//! ```text
//! CONFIG_UPDATE(newchan) ──→ Dispatcher ──→ SystemChannel processor
//!                                                  │
//!                                                  ↓
//!                             ORDERER_TRANSACTION(system) { CONFIG(newchan) }
//!                                                  │
//!                                                  ↓
//!                                        system chain config block
//!                                                  │
//!                                                  ↓
//!                                 Registrar: ledger + processor + chain
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from file/env)
//! 2. Bootstrap the system channel from its genesis config
//! 3. Start every chain
//! 4. Serve broadcasts until Ctrl+C or the system channel halts

pub mod config;
pub mod dispatcher;
pub mod registrar;

pub use config::NodeConfig;
pub use dispatcher::{BroadcastDispatcher, BroadcastError};
pub use registrar::{ChannelHandle, ChannelRegistrar, SystemChannelFilter};

use anyhow::Result;
use oc_02_solo::{Chain, HaltSignal};
use std::sync::Arc;
use tracing::info;

/// The orderer node: registrar plus the broadcast entry point
pub struct OrdererRuntime {
    config: NodeConfig,
    registrar: Arc<ChannelRegistrar>,
    dispatcher: BroadcastDispatcher,
}

impl OrdererRuntime {
    /// Bootstrap the system channel. No chain runs until [`OrdererRuntime::start`].
    pub fn new(config: NodeConfig) -> Result<Self> {
        info!("Creating Quantum-Chain orderer runtime");

        let registrar = ChannelRegistrar::new(&config)?;
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&registrar));

        Ok(Self {
            config,
            registrar,
            dispatcher,
        })
    }

    /// Start every chain. Must be called inside a Tokio runtime.
    pub fn start(&self) {
        info!("===========================================");
        info!("  Quantum-Chain Orderer v{}", env!("CARGO_PKG_VERSION"));
        info!("  Consensus: solo");
        info!("===========================================");

        self.registrar.start_all();

        info!("System channel: {}", self.config.system_channel_id);
        info!(
            "Batch: {} messages / {} ms",
            self.config.batch.max_message_count, self.config.batch.batch_timeout_ms
        );
    }

    pub fn dispatcher(&self) -> &BroadcastDispatcher {
        &self.dispatcher
    }

    pub fn registrar(&self) -> &Arc<ChannelRegistrar> {
        &self.registrar
    }

    /// Ready once the system channel's chain has halted
    pub fn system_errored(&self) -> Result<HaltSignal> {
        Ok(self.registrar.system_channel()?.chain.errored())
    }

    /// Halt every chain
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.registrar.halt_all();
        info!("Shutdown complete");
    }
}
