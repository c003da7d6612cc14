//! Outbound Ports (Driven Ports / SPI)
//!
//! The sequencing task owns its support by value: cutter and ledger writer
//! are single-consumer and are only ever reached through `&mut self`.

use oc_01_msg_processor::Processor;
use shared_types::{Block, Envelope};
use std::time::Duration;

/// Groups admitted messages into batches.
pub trait BlockCutter: Send {
    /// Add a message; returns every batch this completed, oldest first, and
    /// whether messages are still left pending afterwards.
    fn ordered(&mut self, env: Envelope) -> (Vec<Vec<Envelope>>, bool);

    /// Return whatever is pending as a batch, possibly empty.
    fn cut(&mut self) -> Vec<Envelope>;
}

/// Everything a sequencing task needs for its channel.
pub trait ConsenterSupport: Processor + 'static {
    /// The channel's batch cutter.
    fn block_cutter(&mut self) -> &mut dyn BlockCutter;

    /// How long a pending batch may wait.
    fn batch_timeout(&self) -> Duration;

    /// Channel ID.
    fn chain_id(&self) -> String;

    /// Build the block that follows the ledger's current tip.
    fn create_next_block(&self, envelopes: Vec<Envelope>) -> Block;

    /// Commit a block of normal messages.
    fn write_block(&mut self, block: Block, encoded_metadata: Option<Vec<u8>>)
        -> Result<(), String>;

    /// Commit a block holding a single config message.
    fn write_config_block(
        &mut self,
        block: Block,
        encoded_metadata: Option<Vec<u8>>,
    ) -> Result<(), String>;
}

/// Told about every config block once it is on the ledger.
pub trait ConfigBlockObserver: Send + Sync {
    /// React to a committed config block of `channel_id`.
    fn config_block_written(&self, channel_id: &str, block: &Block) -> Result<(), String>;
}

/// Mock implementations for testing
#[cfg(test)]
pub mod mocks {
    use super::*;
    use oc_01_msg_processor::{classify, Classification, ProcessorError};
    use parking_lot::Mutex;
    use shared_types::ChannelHeader;
    use std::collections::HashSet;

    /// Accepts everything except explicitly rejected transaction IDs
    #[derive(Default)]
    pub struct MockProcessor {
        pub sequence: u64,
        pub rejected: Mutex<HashSet<String>>,
        pub validated: Mutex<Vec<String>>,
    }

    impl MockProcessor {
        pub fn reject(&self, env: &Envelope) {
            let tx_id = env.channel_header().unwrap().tx_id;
            self.rejected.lock().insert(tx_id);
        }
    }

    impl Processor for MockProcessor {
        fn classify_msg(&self, chdr: &ChannelHeader) -> Result<Classification, ProcessorError> {
            classify(chdr)
        }

        fn process_normal_msg(&self, env: &Envelope) -> Result<u64, ProcessorError> {
            let tx_id = env.channel_header()?.tx_id;
            self.validated.lock().push(tx_id.clone());
            if self.rejected.lock().contains(&tx_id) {
                return Err(ProcessorError::ValidationFailure {
                    rule: "MockProcessor",
                    reason: "rejected".into(),
                });
            }
            Ok(self.sequence)
        }

        fn process_config_update_msg(
            &self,
            env: &Envelope,
        ) -> Result<(Envelope, u64), ProcessorError> {
            Ok((env.clone(), self.sequence))
        }
    }

    /// Records config blocks it is told about
    #[derive(Default)]
    pub struct RecordingObserver {
        pub seen: Mutex<Vec<(String, u64)>>,
        pub fail: bool,
    }

    impl ConfigBlockObserver for RecordingObserver {
        fn config_block_written(&self, channel_id: &str, block: &Block) -> Result<(), String> {
            self.seen
                .lock()
                .push((channel_id.to_string(), block.header.number));
            if self.fail {
                return Err("observer failed".into());
            }
            Ok(())
        }
    }
}
