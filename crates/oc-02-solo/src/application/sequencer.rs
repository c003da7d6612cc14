//! The sequencing loop
//!
//! One task per channel. It multiplexes three event sources:
//!
//! | Source | Reaction |
//! |--------|----------|
//! | exit signal | stop; nothing further is written |
//! | batch timer | cut whatever is pending into a block |
//! | admission | re-validate, then batch or isolate the message |
//!
//! The timer is a deadline owned by the loop: armed when a message is left
//! pending, re-armed when a cut leaves messages behind, cleared once
//! nothing is pending.

use crate::domain::signal::close;
use crate::ports::outbound::ConsenterSupport;
use oc_01_msg_processor::{Classification, ProcessorError};
use quantum_telemetry::{
    metric_inc, metric_observe, BATCH_TIMEOUTS, BLOCKS_WRITTEN, BLOCK_ENVELOPES,
    CONFIG_BLOCKS_WRITTEN, ENVELOPES_DISCARDED, ENVELOPES_ORDERED,
};
use shared_types::Envelope;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// A message handed to the loop, plus the acknowledgement that it was taken
pub(crate) struct Admission {
    pub(crate) env: Envelope,
    pub(crate) ack: oneshot::Sender<()>,
}

pub(crate) struct Sequencer {
    support: Box<dyn ConsenterSupport>,
    channel: String,
    exit: Arc<watch::Sender<bool>>,
    deadline: Option<Instant>,
}

impl Sequencer {
    pub(crate) fn new(support: Box<dyn ConsenterSupport>, exit: Arc<watch::Sender<bool>>) -> Self {
        let channel = support.chain_id();
        Self {
            support,
            channel,
            exit,
            deadline: None,
        }
    }

    /// Run until the chain halts.
    ///
    /// # Panics
    ///
    /// If an admitted message cannot be re-classified. Admission only
    /// happens after classification succeeded, so this is a broken caller.
    pub(crate) async fn run(mut self, mut admissions: mpsc::Receiver<Admission>) {
        let mut exit = self.exit.subscribe();
        info!("[solo] Sequencing loop started");

        loop {
            let deadline = self.deadline;
            let timer = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;

                _ = exit.wait_for(|halted| *halted) => break,

                _ = timer => self.on_timeout(),

                admission = admissions.recv() => match admission {
                    Some(Admission { env, ack }) => {
                        // The caller may have given up; the message is ours either way
                        let _ = ack.send(());
                        self.on_envelope(env);
                    }
                    None => break,
                },
            }
        }

        info!("[solo] Sequencing loop exited");
    }

    fn on_envelope(&mut self, env: Envelope) {
        let class = match env
            .channel_header()
            .map_err(ProcessorError::from)
            .and_then(|chdr| self.support.classify_msg(&chdr))
        {
            Ok(class) => class,
            Err(e) => panic!(
                "[solo] Message admitted to channel {} could not be re-classified: {e}",
                self.channel
            ),
        };

        if let Err(e) = self.support.process_normal_msg(&env) {
            warn!(class = %class, error = %e, "[solo] Discarding message that failed re-validation");
            metric_inc!(ENVELOPES_DISCARDED, &[self.channel.as_str(), e.label()]);
            return;
        }
        metric_inc!(ENVELOPES_ORDERED, &[self.channel.as_str()]);

        match class {
            Classification::ConfigUpdateMsg => self.on_config(env),
            Classification::NormalMsg => self.on_normal(env),
        }
    }

    fn on_normal(&mut self, env: Envelope) {
        let (batches, pending) = self.support.block_cutter().ordered(env);
        let cut_any = !batches.is_empty();

        for batch in batches {
            if !self.write_batch(batch) {
                return;
            }
        }

        if !pending {
            self.deadline = None;
        } else if cut_any || self.deadline.is_none() {
            // Leftovers after a cut open a fresh window
            let timeout = self.support.batch_timeout();
            debug!(?timeout, "[solo] Arming batch timer");
            self.deadline = Some(Instant::now() + timeout);
        }
    }

    fn on_config(&mut self, env: Envelope) {
        let pending = self.support.block_cutter().cut();
        if !pending.is_empty() && !self.write_batch(pending) {
            return;
        }

        let block = self.support.create_next_block(vec![env]);
        let block_number = block.header.number;
        if let Err(reason) = self.support.write_config_block(block, None) {
            self.fail(block_number, &reason);
            return;
        }

        info!(block_number, "[solo] Config block written");
        metric_inc!(CONFIG_BLOCKS_WRITTEN, &[self.channel.as_str()]);
        self.deadline = None;
    }

    fn on_timeout(&mut self) {
        self.deadline = None;
        metric_inc!(BATCH_TIMEOUTS, &[self.channel.as_str()]);

        let batch = self.support.block_cutter().cut();
        if batch.is_empty() {
            warn!("[solo] Batch timer expired with no pending requests, this might indicate a bug");
            return;
        }

        debug!(tx_count = batch.len(), "[solo] Batch timer expired, creating block");
        self.write_batch(batch);
    }

    /// Write a normal block. Returns `false` if the chain had to halt.
    fn write_batch(&mut self, batch: Vec<Envelope>) -> bool {
        let tx_count = batch.len();
        let block = self.support.create_next_block(batch);
        let block_number = block.header.number;

        if let Err(reason) = self.support.write_block(block, None) {
            self.fail(block_number, &reason);
            return false;
        }

        debug!(block_number, tx_count, "[solo] Block written");
        metric_inc!(BLOCKS_WRITTEN, &[self.channel.as_str()]);
        metric_observe!(BLOCK_ENVELOPES, &[self.channel.as_str()], tx_count as f64);
        true
    }

    /// A block could not be committed; continuing would skip it.
    fn fail(&mut self, block_number: u64, reason: &str) {
        error!(block_number, %reason, "[solo] Could not write block, halting chain");
        self.deadline = None;
        close(&self.exit);
    }
}
