//! Chain support
//!
//! Composes a channel's processor, batch cutter and ledger into the
//! [`ConsenterSupport`] a sequencing task owns.

use crate::adapters::cutter::SizeBatchCutter;
use crate::adapters::ledger::InMemoryLedger;
use crate::config::SoloConfig;
use crate::ports::outbound::{BlockCutter, ConfigBlockObserver, ConsenterSupport};
use oc_01_msg_processor::{Classification, Processor, ProcessorError};
use shared_types::{Block, ChannelHeader, Envelope};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Everything one channel's sequencing task needs
pub struct ChainSupport {
    processor: Arc<dyn Processor>,
    cutter: SizeBatchCutter,
    ledger: InMemoryLedger,
    batch_timeout: Duration,
    observer: Option<Arc<dyn ConfigBlockObserver>>,
}

impl ChainSupport {
    pub fn new(processor: Arc<dyn Processor>, ledger: InMemoryLedger, config: &SoloConfig) -> Self {
        Self {
            processor,
            cutter: SizeBatchCutter::new(config),
            ledger,
            batch_timeout: config.batch_timeout(),
            observer: None,
        }
    }

    /// Notify `observer` of every config block written
    pub fn with_observer(mut self, observer: Arc<dyn ConfigBlockObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }
}

impl Processor for ChainSupport {
    fn classify_msg(&self, chdr: &ChannelHeader) -> Result<Classification, ProcessorError> {
        self.processor.classify_msg(chdr)
    }

    fn process_normal_msg(&self, env: &Envelope) -> Result<u64, ProcessorError> {
        self.processor.process_normal_msg(env)
    }

    fn process_config_update_msg(
        &self,
        env: &Envelope,
    ) -> Result<(Envelope, u64), ProcessorError> {
        self.processor.process_config_update_msg(env)
    }
}

impl ConsenterSupport for ChainSupport {
    fn block_cutter(&mut self) -> &mut dyn BlockCutter {
        &mut self.cutter
    }

    fn batch_timeout(&self) -> Duration {
        self.batch_timeout
    }

    fn chain_id(&self) -> String {
        self.ledger.chain_id().to_string()
    }

    fn create_next_block(&self, envelopes: Vec<Envelope>) -> Block {
        self.ledger.create_next_block(envelopes)
    }

    fn write_block(
        &mut self,
        block: Block,
        encoded_metadata: Option<Vec<u8>>,
    ) -> Result<(), String> {
        self.ledger
            .append(block, encoded_metadata, false)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn write_config_block(
        &mut self,
        block: Block,
        encoded_metadata: Option<Vec<u8>>,
    ) -> Result<(), String> {
        let block = self
            .ledger
            .append(block, encoded_metadata, true)
            .map_err(|e| e.to_string())?;

        // The block is committed; a failing observer must not undo that
        if let Some(observer) = &self.observer {
            if let Err(reason) = observer.config_block_written(self.ledger.chain_id(), &block) {
                error!(
                    channel = %self.ledger.chain_id(),
                    block_number = block.header.number,
                    %reason,
                    "[solo] Config block observer failed"
                );
            }
        }
        Ok(())
    }
}
