//! Size-bounded batch cutter

use crate::config::SoloConfig;
use crate::ports::outbound::BlockCutter;
use shared_types::Envelope;
use tracing::debug;

/// Cuts a batch when it reaches the message count, or when the next message
/// would push it past the preferred byte size.
///
/// A message that alone exceeds the preferred size is isolated: the pending
/// batch is cut first and the message becomes a batch of its own.
pub struct SizeBatchCutter {
    max_message_count: usize,
    preferred_max_bytes: usize,
    pending: Vec<Envelope>,
    pending_bytes: usize,
}

impl SizeBatchCutter {
    pub fn new(config: &SoloConfig) -> Self {
        Self {
            max_message_count: config.max_message_count.max(1) as usize,
            preferred_max_bytes: config.preferred_max_bytes as usize,
            pending: Vec::new(),
            pending_bytes: 0,
        }
    }

    /// Messages waiting for the next cut
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl BlockCutter for SizeBatchCutter {
    fn ordered(&mut self, env: Envelope) -> (Vec<Vec<Envelope>>, bool) {
        let size = env.size();
        let mut batches = Vec::new();

        if size > self.preferred_max_bytes {
            debug!(size, "[solo] Oversized message, cutting it into its own batch");
            if !self.pending.is_empty() {
                batches.push(self.cut());
            }
            batches.push(vec![env]);
            return (batches, false);
        }

        if self.pending_bytes + size > self.preferred_max_bytes {
            debug!(
                pending_bytes = self.pending_bytes,
                size, "[solo] Message would overflow batch, cutting pending batch"
            );
            batches.push(self.cut());
        }

        self.pending.push(env);
        self.pending_bytes += size;

        if self.pending.len() >= self.max_message_count {
            batches.push(self.cut());
        }

        (batches, !self.pending.is_empty())
    }

    fn cut(&mut self) -> Vec<Envelope> {
        self.pending_bytes = 0;
        std::mem::take(&mut self.pending)
    }
}
