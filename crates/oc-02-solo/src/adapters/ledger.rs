//! In-memory, hash-chained block ledger
//!
//! Each block's `previous_hash` is the SHA-256 of the prior header, and
//! every block records the number of the latest config block in its
//! `LAST_CONFIG` metadata slot.

use crate::domain::errors::LedgerError;
use parking_lot::RwLock;
use shared_types::{metadata_index, Block, Envelope, Hash};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the committed-block broadcast
const BLOCK_BROADCAST_CAPACITY: usize = 256;

#[derive(Default)]
struct LedgerState {
    blocks: Vec<Block>,
    last_config: Option<u64>,
}

/// A channel's ledger. Clones share the same blocks.
#[derive(Clone)]
pub struct InMemoryLedger {
    chain_id: String,
    state: Arc<RwLock<LedgerState>>,
    committed: broadcast::Sender<Block>,
}

impl InMemoryLedger {
    /// Empty ledger
    pub fn new(chain_id: impl Into<String>) -> Self {
        let (committed, _) = broadcast::channel(BLOCK_BROADCAST_CAPACITY);
        Self {
            chain_id: chain_id.into(),
            state: Arc::new(RwLock::new(LedgerState::default())),
            committed,
        }
    }

    /// Ledger whose block 0 is a config block holding `genesis_config`
    pub fn with_genesis(
        chain_id: impl Into<String>,
        genesis_config: Envelope,
    ) -> Result<Self, LedgerError> {
        let ledger = Self::new(chain_id);
        let genesis = ledger.create_next_block(vec![genesis_config]);
        ledger.append(genesis, None, true)?;
        Ok(ledger)
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Number of blocks
    pub fn height(&self) -> u64 {
        self.state.read().blocks.len() as u64
    }

    pub fn block(&self, number: u64) -> Option<Block> {
        self.state.read().blocks.get(number as usize).cloned()
    }

    /// All blocks, in order
    pub fn blocks(&self) -> Vec<Block> {
        self.state.read().blocks.clone()
    }

    /// Number of the most recent config block
    pub fn last_config_index(&self) -> Option<u64> {
        self.state.read().last_config
    }

    /// Receive every block committed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Block> {
        self.committed.subscribe()
    }

    /// Block following the current tip
    pub fn create_next_block(&self, envelopes: Vec<Envelope>) -> Block {
        let state = self.state.read();
        let previous_hash: Hash = state
            .blocks
            .last()
            .map(|block| block.header.hash())
            .unwrap_or_default();
        Block::new(state.blocks.len() as u64, previous_hash, envelopes)
    }

    /// Append a block, filling its metadata. Returns the block as stored.
    pub fn append(
        &self,
        mut block: Block,
        encoded_metadata: Option<Vec<u8>>,
        is_config: bool,
    ) -> Result<Block, LedgerError> {
        let mut state = self.state.write();
        let number = block.header.number;

        let expected = state.blocks.len() as u64;
        if number != expected {
            return Err(LedgerError::OutOfSequence {
                expected,
                actual: number,
            });
        }

        let previous_hash = state
            .blocks
            .last()
            .map(|tip| tip.header.hash())
            .unwrap_or_default();
        if block.header.previous_hash != previous_hash {
            return Err(LedgerError::PreviousHashMismatch { number });
        }
        if block.header.data_hash != block.data.hash() {
            return Err(LedgerError::DataHashMismatch { number });
        }

        if is_config {
            state.last_config = Some(number);
        }
        if let Some(last_config) = state.last_config {
            block.metadata.metadata[metadata_index::LAST_CONFIG] =
                last_config.to_be_bytes().to_vec();
        }
        block.metadata.metadata[metadata_index::ORDERER] = encoded_metadata.unwrap_or_default();

        state.blocks.push(block.clone());
        drop(state);

        // No subscribers is fine
        let _ = self.committed.send(block.clone());
        Ok(block)
    }
}
