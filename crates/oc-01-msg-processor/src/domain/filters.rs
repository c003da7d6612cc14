//! Rule filters applied to every message a channel processes
//!
//! Rules run in order; the first rejection wins.

use crate::domain::errors::ProcessorError;
use crate::ports::outbound::StandardChannelSupport;
use shared_types::Envelope;
use std::sync::Arc;

/// A single admission rule
pub trait Rule: Send + Sync {
    /// Name reported in validation failures
    fn name(&self) -> &'static str;

    /// Accept or reject the envelope
    fn apply(&self, env: &Envelope) -> Result<(), String>;
}

/// Rejects envelopes with an empty payload
pub struct EmptyRejectRule;

impl Rule for EmptyRejectRule {
    fn name(&self) -> &'static str {
        "EmptyRejectRule"
    }

    fn apply(&self, env: &Envelope) -> Result<(), String> {
        if env.payload.is_empty() {
            return Err("message was empty".to_string());
        }
        Ok(())
    }
}

/// Rejects envelopes larger than the channel's absolute maximum
pub struct SizeFilter {
    support: Arc<dyn StandardChannelSupport>,
}

impl SizeFilter {
    pub fn new(support: Arc<dyn StandardChannelSupport>) -> Self {
        Self { support }
    }
}

impl Rule for SizeFilter {
    fn name(&self) -> &'static str {
        "SizeFilter"
    }

    fn apply(&self, env: &Envelope) -> Result<(), String> {
        let max = self.support.absolute_max_bytes();
        let size = env.size();
        if size > max {
            return Err(format!(
                "message payload is {size} bytes and exceeds maximum allowed {max} bytes"
            ));
        }
        Ok(())
    }
}

/// Delegates to the channel's writers policy
pub struct PolicyRule {
    support: Arc<dyn StandardChannelSupport>,
}

impl PolicyRule {
    pub fn new(support: Arc<dyn StandardChannelSupport>) -> Self {
        Self { support }
    }
}

impl Rule for PolicyRule {
    fn name(&self) -> &'static str {
        "PolicyRule"
    }

    fn apply(&self, env: &Envelope) -> Result<(), String> {
        self.support.evaluate_writers(env)
    }
}

/// Ordered collection of rules
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// The rules every standard channel applies: empty, size, policy
    pub fn standard(support: Arc<dyn StandardChannelSupport>) -> Self {
        Self::new(vec![
            Box::new(EmptyRejectRule),
            Box::new(SizeFilter::new(Arc::clone(&support))),
            Box::new(PolicyRule::new(support)),
        ])
    }

    /// Append a rule after the existing ones
    pub fn with_rule(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Apply every rule in order, stopping at the first rejection
    pub fn apply(&self, env: &Envelope) -> Result<(), ProcessorError> {
        for rule in &self.rules {
            rule.apply(env)
                .map_err(|reason| ProcessorError::ValidationFailure {
                    rule: rule.name(),
                    reason,
                })?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::mocks::MockStandardSupport;

    fn envelope(len: usize) -> Envelope {
        Envelope {
            payload: vec![1u8; len],
            signature: vec![],
        }
    }

    #[test]
    fn test_empty_payload_rejected() {
        let support = Arc::new(MockStandardSupport::new("mychannel", 0));
        let rules = RuleSet::standard(support);

        let err = rules.apply(&envelope(0)).unwrap_err();

        assert!(matches!(
            err,
            ProcessorError::ValidationFailure {
                rule: "EmptyRejectRule",
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_rejected() {
        let mut support = MockStandardSupport::new("mychannel", 0);
        support.absolute_max_bytes = 8;
        let rules = RuleSet::standard(Arc::new(support));

        assert!(rules.apply(&envelope(8)).is_ok());
        assert!(matches!(
            rules.apply(&envelope(9)),
            Err(ProcessorError::ValidationFailure {
                rule: "SizeFilter",
                ..
            })
        ));
    }

    #[test]
    fn test_policy_rejection_reported() {
        let mut support = MockStandardSupport::new("mychannel", 0);
        support.writers_error = Some("not a writer".into());
        let rules = RuleSet::standard(Arc::new(support));

        let err = rules.apply(&envelope(4)).unwrap_err();

        assert_eq!(
            err,
            ProcessorError::ValidationFailure {
                rule: "PolicyRule",
                reason: "not a writer".into()
            }
        );
    }

    #[test]
    fn test_first_rejection_wins() {
        let mut support = MockStandardSupport::new("mychannel", 0);
        support.writers_error = Some("not a writer".into());
        let rules = RuleSet::standard(Arc::new(support));

        // Empty payload trips the first rule before the policy is consulted
        assert!(matches!(
            rules.apply(&envelope(0)),
            Err(ProcessorError::ValidationFailure {
                rule: "EmptyRejectRule",
                ..
            })
        ));
        assert_eq!(rules.len(), 3);
    }

    struct RejectAll;

    impl Rule for RejectAll {
        fn name(&self) -> &'static str {
            "RejectAll"
        }

        fn apply(&self, _env: &Envelope) -> Result<(), String> {
            Err("closed".into())
        }
    }

    #[test]
    fn test_appended_rule_runs_last() {
        let support = Arc::new(MockStandardSupport::new("mychannel", 0));
        let rules = RuleSet::standard(support).with_rule(Box::new(RejectAll));

        assert_eq!(rules.len(), 4);
        assert!(matches!(
            rules.apply(&envelope(0)),
            Err(ProcessorError::ValidationFailure {
                rule: "EmptyRejectRule",
                ..
            })
        ));
        assert_eq!(
            rules.apply(&envelope(4)),
            Err(ProcessorError::ValidationFailure {
                rule: "RejectAll",
                reason: "closed".into()
            })
        );
    }
}
