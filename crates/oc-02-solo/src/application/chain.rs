//! Solo chain
//!
//! Admission side of a channel's sequencing pipeline. Callers hand messages
//! over one at a time through a capacity-1 channel; each hand-off completes
//! when the sequencing task acknowledges it took the message.
//!
//! ```text
//! order()/configure() ──(env, ack)──→ [mpsc(1)] ──→ Sequencer ──→ ledger
//!          ↑                                             │
//!          └──────────────── ack (oneshot) ──────────────┘
//! ```

use crate::application::sequencer::{Admission, Sequencer};
use crate::domain::errors::ChainError;
use crate::domain::signal::{close, HaltSignal};
use crate::ports::inbound::Chain;
use crate::ports::outbound::ConsenterSupport;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::Envelope;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn, Instrument, Span};

/// State held until `start` hands it to the sequencing task
struct Pending {
    support: Box<dyn ConsenterSupport>,
    admissions: mpsc::Receiver<Admission>,
}

/// A single-node ordering chain for one channel
pub struct SoloChain {
    chain_id: String,
    admissions: mpsc::Sender<Admission>,
    pending: Mutex<Option<Pending>>,
    exit: Arc<watch::Sender<bool>>,
    span: Span,
}

impl SoloChain {
    pub fn new(support: Box<dyn ConsenterSupport>) -> Self {
        let chain_id = support.chain_id();
        let (admissions, receiver) = mpsc::channel(1);
        let (exit, _) = watch::channel(false);
        let span = tracing::info_span!("solo", channel = %chain_id);

        Self {
            chain_id,
            admissions,
            pending: Mutex::new(Some(Pending {
                support,
                admissions: receiver,
            })),
            exit: Arc::new(exit),
            span,
        }
    }

    /// Replace the span the chain logs under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn is_halted(&self) -> bool {
        *self.exit.borrow()
    }

    async fn admit(&self, env: Envelope) -> Result<(), ChainError> {
        let mut exit = self.exit.subscribe();
        if *exit.borrow_and_update() {
            return Err(ChainError::ChainHalted);
        }

        let (ack, acked) = oneshot::channel();
        let handoff = async {
            self.admissions
                .send(Admission { env, ack })
                .await
                .map_err(|_| ChainError::ChainHalted)?;
            // Dropped unacknowledged when the loop exits with it still queued
            acked.await.map_err(|_| ChainError::ChainHalted)
        };

        tokio::select! {
            biased;
            result = handoff => result,
            _ = exit.wait_for(|halted| *halted) => Err(ChainError::ChainHalted),
        }
    }
}

#[async_trait]
impl Chain for SoloChain {
    async fn order(&self, env: Envelope, config_seq: u64) -> Result<(), ChainError> {
        debug!(parent: &self.span, config_seq, "[solo] Ordering message");
        self.admit(env).await
    }

    /// Shares the admission path with `order`; the sequencing task isolates
    /// config messages by classification.
    async fn configure(
        &self,
        _config_update: Envelope,
        config: Envelope,
        config_seq: u64,
    ) -> Result<(), ChainError> {
        debug!(parent: &self.span, config_seq, "[solo] Ordering config message");
        self.admit(config).await
    }

    fn start(&self) {
        let _entered = self.span.enter();

        if self.is_halted() {
            warn!("[solo] Start requested after halt, ignoring");
            return;
        }

        let mut slot = self.pending.lock();
        let Some(pending) = slot.take() else {
            warn!("[solo] Chain already started, ignoring");
            return;
        };

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "[solo] No Tokio runtime to start the chain on");
                *slot = Some(pending);
                return;
            }
        };

        let sequencer = Sequencer::new(pending.support, Arc::clone(&self.exit));
        runtime.spawn(
            sequencer
                .run(pending.admissions)
                .instrument(self.span.clone()),
        );
        info!("[solo] Chain started");
    }

    fn halt(&self) {
        if close(&self.exit) {
            info!(parent: &self.span, "[solo] Chain halted");
        }
    }

    fn errored(&self) -> HaltSignal {
        HaltSignal::new(self.exit.subscribe())
    }
}

impl Drop for SoloChain {
    fn drop(&mut self) {
        close(&self.exit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ChainSupport, InMemoryLedger};
    use crate::config::SoloConfig;
    use crate::ports::outbound::mocks::MockProcessor;
    use proptest::prelude::*;
    use quantum_telemetry::{ENVELOPES_DISCARDED, ENVELOPES_ORDERED};
    use shared_crypto::Ed25519Signer;
    use shared_types::{create_signed_envelope, Block, HeaderType};
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tokio::time::{advance, timeout};

    const CHANNEL: &str = "mychannel";

    fn envelope(header_type: HeaderType, data: &[u8]) -> Envelope {
        create_signed_envelope(
            header_type,
            CHANNEL,
            &Ed25519Signer::from_seed([3u8; 32]),
            &data.to_vec(),
            0,
            0,
        )
        .unwrap()
    }

    fn normal(data: &[u8]) -> Envelope {
        envelope(HeaderType::EndorserTransaction, data)
    }

    fn config(data: &[u8]) -> Envelope {
        envelope(HeaderType::Config, data)
    }

    struct Harness {
        chain: SoloChain,
        ledger: InMemoryLedger,
        processor: Arc<MockProcessor>,
        blocks: broadcast::Receiver<Block>,
    }

    fn harness(max_message_count: u32, batch_timeout_ms: u64) -> Harness {
        harness_with(
            CHANNEL,
            SoloConfig {
                max_message_count,
                batch_timeout_ms,
                ..Default::default()
            },
        )
    }

    fn harness_with(channel: &str, config: SoloConfig) -> Harness {
        let processor = Arc::new(MockProcessor::default());
        let ledger = InMemoryLedger::new(channel);
        let support = ChainSupport::new(processor.clone(), ledger.clone(), &config);
        let blocks = ledger.subscribe();

        Harness {
            chain: SoloChain::new(Box::new(support)),
            ledger,
            processor,
            blocks,
        }
    }

    async fn next_block(blocks: &mut broadcast::Receiver<Block>) -> Block {
        timeout(Duration::from_secs(60), blocks.recv())
            .await
            .expect("no block written")
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_timeout_cuts_partial_batch() {
        let mut h = harness(5, 2_000);
        h.chain.start();
        let msgs = [normal(b"a"), normal(b"b"), normal(b"c")];

        for msg in &msgs {
            h.chain.order(msg.clone(), 0).await.unwrap();
        }
        advance(Duration::from_millis(1_999)).await;
        assert_eq!(h.ledger.height(), 0);

        let block = next_block(&mut h.blocks).await;

        assert_eq!(block.header.number, 0);
        assert_eq!(block.data.envelopes, msgs.to_vec());
        assert_eq!(h.ledger.height(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_batch_written_without_timer() {
        let mut h = harness(3, 2_000);
        h.chain.start();
        let started = tokio::time::Instant::now();

        for data in [b"a", b"b", b"c"] {
            h.chain.order(normal(data), 0).await.unwrap();
        }
        let block = next_block(&mut h.blocks).await;

        assert_eq!(block.len(), 3);
        assert!(started.elapsed() < Duration::from_millis(2_000));

        // The timer was cleared with the cut: no empty block follows
        advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert_eq!(h.ledger.height(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leftover_after_size_cut_written_on_timeout() {
        let (a, b) = (normal(b"a"), normal(b"b"));
        let mut h = harness_with(
            CHANNEL,
            SoloConfig {
                max_message_count: 10,
                batch_timeout_ms: 2_000,
                preferred_max_bytes: (a.size() * 3 / 2) as u32,
                ..Default::default()
            },
        );
        h.chain.start();

        h.chain.order(a.clone(), 0).await.unwrap();
        h.chain.order(b.clone(), 0).await.unwrap();

        let first = next_block(&mut h.blocks).await;
        let started = tokio::time::Instant::now();
        let second = next_block(&mut h.blocks).await;

        assert_eq!(first.data.envelopes, vec![a]);
        assert_eq!(second.data.envelopes, vec![b]);
        assert!(started.elapsed() >= Duration::from_millis(2_000));
        assert_eq!(h.ledger.height(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discarded_message_not_counted_as_ordered() {
        let mut h = harness_with(
            "metered",
            SoloConfig {
                max_message_count: 2,
                ..Default::default()
            },
        );
        h.chain.start();
        let bad = normal(b"bad");
        h.processor.reject(&bad);

        h.chain.order(normal(b"1"), 0).await.unwrap();
        h.chain.order(bad, 0).await.unwrap();
        h.chain.order(normal(b"2"), 0).await.unwrap();
        next_block(&mut h.blocks).await;

        let ordered = ENVELOPES_ORDERED.with_label_values(&["metered"]).get();
        let discarded = ENVELOPES_DISCARDED
            .with_label_values(&["metered", "validation"])
            .get();
        assert_eq!(ordered, 2.0);
        assert_eq!(discarded, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_message_isolated() {
        let mut h = harness(10, 2_000);
        h.chain.start();
        let (n1, n2, cfg, n3) = (normal(b"1"), normal(b"2"), config(b"cfg"), normal(b"3"));

        h.chain.order(n1.clone(), 0).await.unwrap();
        h.chain.order(n2.clone(), 0).await.unwrap();
        h.chain
            .configure(normal(b"update"), cfg.clone(), 0)
            .await
            .unwrap();
        h.chain.order(n3.clone(), 0).await.unwrap();

        let pending = next_block(&mut h.blocks).await;
        let config_block = next_block(&mut h.blocks).await;
        let trailing = next_block(&mut h.blocks).await;

        assert_eq!(pending.data.envelopes, vec![n1, n2]);
        assert_eq!(config_block.data.envelopes, vec![cfg]);
        assert_eq!(trailing.data.envelopes, vec![n3]);
        assert_eq!(h.ledger.last_config_index(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_message_never_written() {
        let mut h = harness(2, 2_000);
        h.chain.start();
        let (good, bad, other) = (normal(b"good"), normal(b"bad"), normal(b"other"));
        h.processor.reject(&bad);

        h.chain.order(good.clone(), 0).await.unwrap();
        h.chain.order(bad, 0).await.unwrap();
        h.chain.order(other.clone(), 0).await.unwrap();

        let block = next_block(&mut h.blocks).await;
        assert_eq!(block.data.envelopes, vec![good, other]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_config_leaves_pending_batch() {
        let mut h = harness(10, 2_000);
        h.chain.start();
        let (n1, cfg) = (normal(b"1"), config(b"cfg"));
        h.processor.reject(&cfg);

        h.chain.order(n1.clone(), 0).await.unwrap();
        h.chain.configure(normal(b"u"), cfg, 0).await.unwrap();

        let block = next_block(&mut h.blocks).await;
        assert_eq!(block.data.envelopes, vec![n1]);
        assert_eq!(h.ledger.last_config_index(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_halt_is_idempotent() {
        let h = harness(10, 2_000);
        h.chain.start();
        let errored = h.chain.errored();
        assert!(!errored.is_halted());

        h.chain.halt();
        h.chain.halt();

        errored.halted().await;
        assert!(h.chain.errored().is_halted());
        assert_eq!(
            h.chain.order(normal(b"late"), 0).await,
            Err(ChainError::ChainHalted)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_halts() {
        let h = Arc::new(harness(10, 2_000));
        h.chain.start();

        let halts: Vec<_> = (0..8)
            .map(|_| {
                let h = Arc::clone(&h);
                tokio::spawn(async move { h.chain.halt() })
            })
            .collect();
        for halt in halts {
            halt.await.unwrap();
        }

        h.chain.errored().halted().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_halt_releases_blocked_admission() {
        let h = Arc::new(harness(10, 2_000));
        // Never started: the first message fills the hand-off, the second waits
        let first = {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.chain.order(normal(b"1"), 0).await })
        };
        let second = {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.chain.order(normal(b"2"), 0).await })
        };
        tokio::task::yield_now().await;

        h.chain.halt();

        assert_eq!(first.await.unwrap(), Err(ChainError::ChainHalted));
        assert_eq!(second.await.unwrap(), Err(ChainError::ChainHalted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_after_halt_is_noop() {
        let h = harness(10, 2_000);

        h.chain.halt();
        h.chain.start();

        assert!(h.chain.errored().is_halted());
        assert!(h.chain.pending.lock().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_noop() {
        let mut h = harness(1, 2_000);

        h.chain.start();
        h.chain.start();
        h.chain.order(normal(b"1"), 0).await.unwrap();

        assert_eq!(next_block(&mut h.blocks).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    #[should_panic]
    async fn test_unclassifiable_message_is_fatal() {
        let h = harness(10, 2_000);
        let garbage = Envelope {
            payload: vec![0xFF, 0xFF],
            signature: vec![],
        };
        let (ack, _acked) = oneshot::channel();
        let (tx, rx) = mpsc::channel(1);
        tx.send(Admission { env: garbage, ack }).await.unwrap();
        drop(tx);

        let pending = h.chain.pending.lock().take().unwrap();
        Sequencer::new(pending.support, Arc::clone(&h.chain.exit))
            .run(rx)
            .await;
    }

    proptest! {
        #[test]
        fn prop_blocks_preserve_admission_order(
            payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..32), 1..40),
            max_message_count in 1u32..8,
            preferred_max_bytes in 64u32..1024,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .start_paused(true)
                .build()
                .unwrap();

            let (admitted, written, max_len) = runtime.block_on(async {
                // Small preferred sizes force overflow cuts and isolated messages
                let mut h = harness_with(
                    CHANNEL,
                    SoloConfig {
                        max_message_count,
                        batch_timeout_ms: 2_000,
                        preferred_max_bytes,
                    },
                );
                h.chain.start();

                let mut admitted = Vec::new();
                for payload in &payloads {
                    let env = normal(payload);
                    admitted.push(env.clone());
                    h.chain.order(env, 0).await.unwrap();
                }

                let mut written = Vec::new();
                let mut max_len = 0;
                while written.len() < admitted.len() {
                    let block = next_block(&mut h.blocks).await;
                    max_len = max_len.max(block.len());
                    written.extend(block.data.envelopes);
                }
                (admitted, written, max_len)
            });

            prop_assert_eq!(admitted, written);
            prop_assert!(max_len <= max_message_count as usize);
        }
    }
}
