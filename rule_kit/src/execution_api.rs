//! # Verification API
//!
//! High-level entry point for verifying a library distribution.
//!
//! Users only need to:
//! 1. Build a [`RuleRegistry`] (usually [`RuleRegistry::standard`])
//! 2. Assemble a [`RuleContext`] from their probe, reader and oracle
//! 3. Call [`RuleRegistry::verify`]
//!
//! ## Example
//!
//! ```ignore
//! use rule_kit::execution_api::{RuleContext, RuleRegistry};
//!
//! let registry = RuleRegistry::standard(distribution.strict);
//! let report = registry.verify(&RuleContext {
//!     distribution: &distribution,
//!     filesystem: &filesystem,
//!     packages: &packages,
//!     oracle: &executor,
//! });
//!
//! if !report.passed() {
//!     for (rule_id, reason) in report.summary().failures {
//!         println!("{}: {}", rule_id, reason);
//!     }
//! }
//! ```

use std::collections::HashSet;

use crate::logging::codes;

// ============================================================================
// Re-exports - types users need to run a verification
// ============================================================================

pub use crate::executors::{DistributionRule, FailureKind, RuleContext, RuleError, Severity};
pub use crate::results::{Report, ReportSummary, VerificationVerdict};

// Logging utilities
pub use crate::logging;
pub use crate::{log_debug, log_error, log_info, log_success};

use crate::executors::{
    ArtifactPartitionRule, BuildScriptRule, ChangelogPresenceRule, ConsumerExecutionRule,
    ConsumerLinkageRule, FileOwnershipRule, HeaderInstallationRule, ManifestPresenceRule,
    PackageRegistrationRule, PkgConfigResolutionRule, SharedObjectPlacementRule,
    SonameFormatRule, UnversionedLinkRule, VerificationOutputRule,
};

/// Registry construction errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Rule '{rule_id}' is already registered")]
    DuplicateRule { rule_id: String },
}

/// Ordered set of rules evaluated against one distribution
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn DistributionRule>>,
    ids: HashSet<&'static str>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The packaging contract: thirteen rules, plus file ownership when strict
    pub fn standard(strict: bool) -> Self {
        let mut rules: Vec<Box<dyn DistributionRule>> = vec![
            Box::new(ManifestPresenceRule),
            Box::new(BuildScriptRule),
            Box::new(ChangelogPresenceRule),
            Box::new(ArtifactPartitionRule),
            Box::new(PackageRegistrationRule),
            Box::new(SharedObjectPlacementRule),
            Box::new(SonameFormatRule),
            Box::new(UnversionedLinkRule),
            Box::new(HeaderInstallationRule),
            Box::new(PkgConfigResolutionRule),
            Box::new(ConsumerExecutionRule),
            Box::new(ConsumerLinkageRule),
            Box::new(VerificationOutputRule),
        ];
        if strict {
            rules.push(Box::new(FileOwnershipRule));
        }

        let ids = rules.iter().map(|r| r.rule_id()).collect();
        Self { rules, ids }
    }

    /// Append a rule; its id must be unique within the registry
    pub fn register(&mut self, rule: Box<dyn DistributionRule>) -> Result<(), RegistryError> {
        let rule_id = rule.rule_id();
        if !self.ids.insert(rule_id) {
            return Err(RegistryError::DuplicateRule {
                rule_id: rule_id.to_string(),
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.rule_id()).collect()
    }

    /// Evaluate every rule in order; a failing rule never stops the others
    pub fn verify(&self, ctx: &RuleContext<'_>) -> Report {
        let library = &ctx.distribution.library;
        log_info!(
            "Verifying library distribution",
            "library" => &library.name,
            "version" => &library.full_version,
            "rules" => self.rules.len()
        );

        let mut report = Report::new();

        for rule in &self.rules {
            let outcome = rule.evaluate(ctx);
            let verdict = VerificationVerdict::from_outcome(rule.as_ref(), &outcome);

            match &outcome {
                Ok(()) => {
                    log_success!(codes::success::RULE_PASSED, "Rule passed", "rule" => rule.rule_id());
                }
                Err(e) => {
                    let code = match e {
                        RuleError::Probe(_) => codes::rule::PROBE_FAILURE,
                        RuleError::Launch(_) => codes::rule::LAUNCH_FAILURE,
                        RuleError::Query(_) => codes::rule::QUERY_FAILURE,
                        _ => codes::rule::RULE_FAILED,
                    };
                    log_error!(code, "Rule failed", "rule" => rule.rule_id(), "reason" => e);
                }
            }

            report.record(verdict);
        }

        let summary = report.summary();
        log_success!(
            codes::success::VERIFICATION_COMPLETED,
            "Verification complete",
            "passed" => summary.passed,
            "failed" => summary.failed
        );

        report
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::testing::{FakeOracle, FakePackages, Fixture};

    struct AlwaysFails;

    impl DistributionRule for AlwaysFails {
        fn rule_id(&self) -> &'static str {
            "always-fails"
        }

        fn title(&self) -> &'static str {
            "Always fails"
        }

        fn evaluate(&self, _ctx: &RuleContext<'_>) -> Result<(), RuleError> {
            Err(RuleError::Unmet("nothing to see".to_string()))
        }
    }

    #[test]
    fn test_standard_rule_order() {
        let registry = RuleRegistry::standard(false);

        assert_eq!(registry.len(), 13);
        assert_eq!(registry.rule_ids()[0], "manifest-presence");
        assert_eq!(registry.rule_ids()[12], "verification-output");
        assert!(!registry.rule_ids().contains(&"file-ownership"));

        let strict = RuleRegistry::standard(true);
        assert_eq!(strict.len(), 14);
        assert_eq!(strict.rule_ids()[13], "file-ownership");
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = RuleRegistry::standard(false);

        let err = registry.register(Box::new(ManifestPresenceRule)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRule { ref rule_id } if rule_id == "manifest-presence"));
        assert_eq!(registry.len(), 13);

        registry.register(Box::new(AlwaysFails)).unwrap();
        assert_eq!(registry.len(), 14);
    }

    #[test]
    fn test_every_rule_evaluated() {
        let fixture = Fixture::new();
        let packages = FakePackages::default();
        let oracle = FakeOracle::default();

        let report = RuleRegistry::standard(false).verify(&fixture.context(&packages, &oracle));

        // Nothing is installed in an empty fixture; all rules still report
        assert_eq!(report.verdicts().len(), 13);
        assert!(!report.passed());
        assert!(report.summary().failures.iter().all(|(_, reason)| !reason.is_empty()));
    }

    #[test]
    fn test_custom_registry() {
        let fixture = Fixture::new();
        let packages = FakePackages::default();
        let oracle = FakeOracle::default();

        let mut registry = RuleRegistry::new();
        assert!(registry.is_empty());
        registry.register(Box::new(AlwaysFails)).unwrap();

        let report = registry.verify(&fixture.context(&packages, &oracle));
        assert_eq!(
            report.summary().failures,
            vec![("always-fails".to_string(), "nothing to see".to_string())]
        );
    }
}
