//! Solo consenter

use crate::application::chain::SoloChain;
use crate::domain::errors::ChainError;
use crate::ports::inbound::{Chain, Consenter};
use crate::ports::outbound::ConsenterSupport;
use std::sync::Arc;
use tracing::{debug, warn};

/// Hands out one [`SoloChain`] per channel.
///
/// Solo has no peers to agree with, so it keeps no consenter metadata.
#[derive(Debug, Default)]
pub struct SoloConsenter;

impl SoloConsenter {
    pub fn new() -> Self {
        warn!("[solo] Solo ordering is single-node and not fault tolerant; use it for development and tests");
        Self
    }
}

impl Consenter for SoloConsenter {
    fn handle_chain(
        &self,
        support: Box<dyn ConsenterSupport>,
        metadata: Option<&[u8]>,
    ) -> Result<Arc<dyn Chain>, ChainError> {
        if let Some(metadata) = metadata.filter(|m| !m.is_empty()) {
            debug!(
                channel = %support.chain_id(),
                len = metadata.len(),
                "[solo] Ignoring consenter metadata"
            );
        }
        Ok(Arc::new(SoloChain::new(support)))
    }
}
