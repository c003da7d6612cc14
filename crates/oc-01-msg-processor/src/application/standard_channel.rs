//! Standard Channel Processor
//!
//! Validates messages for an existing channel against its current
//! configuration.

use crate::config::ProcessorConfig;
use crate::domain::classification::{classify, Classification};
use crate::domain::errors::ProcessorError;
use crate::domain::filters::RuleSet;
use crate::ports::inbound::Processor;
use crate::ports::outbound::StandardChannelSupport;
use shared_types::{create_signed_envelope, ChannelHeader, Envelope, HeaderType};
use std::sync::Arc;
use tracing::{debug, warn, Span};

/// Processor for a channel that already exists
///
/// Pipeline for every message:
/// 1. Read the configuration sequence
/// 2. Apply the channel's rule filters
/// 3. (config updates only) propose the update and sign the CONFIG result
pub struct StandardChannel {
    support: Arc<dyn StandardChannelSupport>,
    filters: RuleSet,
    config: ProcessorConfig,
    span: Span,
}

impl StandardChannel {
    /// Create a processor with the standard rule set and default stamps
    pub fn new(support: Arc<dyn StandardChannelSupport>) -> Self {
        Self::with_config(support, ProcessorConfig::default())
    }

    /// Create a processor with custom stamps
    pub fn with_config(support: Arc<dyn StandardChannelSupport>, config: ProcessorConfig) -> Self {
        let span = tracing::info_span!("msgprocessor", channel = %support.chain_id());
        Self {
            filters: RuleSet::standard(Arc::clone(&support)),
            support,
            config,
            span,
        }
    }

    /// Replace the span all processing is logged under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Replace the rule filters
    pub fn with_filters(mut self, filters: RuleSet) -> Self {
        self.filters = filters;
        self
    }

    /// Channel resources this processor validates against
    pub fn support(&self) -> &Arc<dyn StandardChannelSupport> {
        &self.support
    }

    /// Envelope stamps
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Logging span of this processor
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub(crate) fn filters(&self) -> &RuleSet {
        &self.filters
    }
}

impl Processor for StandardChannel {
    fn classify_msg(&self, chdr: &ChannelHeader) -> Result<Classification, ProcessorError> {
        classify(chdr)
    }

    fn process_normal_msg(&self, env: &Envelope) -> Result<u64, ProcessorError> {
        let _entered = self.span.enter();

        // Sequence first: the result must name the config actually validated against
        let config_seq = self.support.sequence();
        if let Err(e) = self.filters.apply(env) {
            debug!(error = %e, "[msgprocessor] Rejecting normal message");
            return Err(e);
        }

        Ok(config_seq)
    }

    fn process_config_update_msg(
        &self,
        env: &Envelope,
    ) -> Result<(Envelope, u64), ProcessorError> {
        let _entered = self.span.enter();

        let config_seq = self.support.sequence();
        self.filters.apply(env)?;

        let config_env = self.support.propose_config_update(env).map_err(|reason| {
            warn!(%reason, "[msgprocessor] Config update rejected by config manager");
            ProcessorError::ValidationFailure {
                rule: "ConfigManager",
                reason,
            }
        })?;

        let signer = self.support.signer();
        let config = create_signed_envelope(
            HeaderType::Config,
            &self.support.chain_id(),
            signer.as_ref(),
            &config_env,
            self.config.msg_version,
            self.config.epoch,
        )
        .map_err(|e| ProcessorError::ValidationFailure {
            rule: "ConfigEnvelope",
            reason: e.to_string(),
        })?;

        debug!(
            config_seq,
            next_sequence = config_env.config.sequence,
            "[msgprocessor] Config update accepted"
        );

        Ok((config, config_seq))
    }
}
