//! # Report Aggregator
//!
//! Collects one [`VerificationVerdict`] per rule, in evaluation order, and
//! summarises them. A run passes only if every verdict passed.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::executors::{DistributionRule, FailureKind, RuleError, Severity};

/// Outcome of one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationVerdict {
    pub rule_id: String,
    pub title: String,
    pub passed: bool,
    /// Diagnostic; present iff the rule failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    pub severity: Severity,
}

impl VerificationVerdict {
    pub fn pass(rule_id: &str, title: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            title: title.to_string(),
            passed: true,
            reason: None,
            failure_kind: None,
            severity: Severity::Failure,
        }
    }

    pub fn fail(rule_id: &str, title: &str, error: &RuleError) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            title: title.to_string(),
            passed: false,
            reason: Some(error.to_string()),
            failure_kind: Some(error.failure_kind()),
            severity: error.severity(),
        }
    }

    /// Verdict for `rule` from its evaluation result
    pub fn from_outcome(rule: &dyn DistributionRule, outcome: &Result<(), RuleError>) -> Self {
        match outcome {
            Ok(()) => Self::pass(rule.rule_id(), rule.title()),
            Err(e) => Self::fail(rule.rule_id(), rule.title(), e),
        }
    }
}

/// Counts and failure list of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// `(rule_id, reason)` of each failed verdict, in order
    pub failures: Vec<(String, String)>,
}

/// Ordered verdicts of one verification run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    verdicts: Vec<VerificationVerdict>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, verdict: VerificationVerdict) {
        self.verdicts.push(verdict);
    }

    pub fn verdicts(&self) -> &[VerificationVerdict] {
        &self.verdicts
    }

    pub fn verdict(&self, rule_id: &str) -> Option<&VerificationVerdict> {
        self.verdicts.iter().find(|v| v.rule_id == rule_id)
    }

    pub fn summary(&self) -> ReportSummary {
        let failures: Vec<(String, String)> = self
            .verdicts
            .iter()
            .filter(|v| !v.passed)
            .map(|v| (v.rule_id.clone(), v.reason.clone().unwrap_or_default()))
            .collect();

        ReportSummary {
            total: self.verdicts.len(),
            passed: self.verdicts.len() - failures.len(),
            failed: failures.len(),
            failures,
        }
    }

    /// True when every recorded verdict passed
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }

    /// Whether any failure came from an unobservable system rather than a violated condition
    pub fn has_errors(&self) -> bool {
        self.verdicts
            .iter()
            .any(|v| !v.passed && v.severity == Severity::Error)
    }

    /// SHA-256 over `rule_id|passed|reason` lines, hex encoded
    pub fn verdict_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for verdict in &self.verdicts {
            hasher.update(verdict.rule_id.as_bytes());
            hasher.update(b"|");
            hasher.update(if verdict.passed { b"pass" as &[u8] } else { b"fail" });
            hasher.update(b"|");
            hasher.update(verdict.reason.as_deref().unwrap_or("").as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}
