//! Full result builder
//!
//! Builds complete results: every verdict, the summary, run metadata and
//! the verdict digest used to compare runs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use rule_kit::contracts::LibraryDistribution;
use rule_kit::execution_api::{Report, ReportSummary, VerificationVerdict};

use super::TOOL_NAME;

/// Tool that produced the result
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Identity of the verified distribution
#[derive(Debug, Clone, Serialize)]
pub struct DistributionInfo {
    pub library: String,
    pub full_version: String,
    pub soname: String,
    pub runtime_packages: Vec<String>,
    pub development_package: String,
    pub strict: bool,
}

/// Complete verification result
#[derive(Debug, Clone, Serialize)]
pub struct FullResult {
    pub tool: ToolInfo,
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub distribution: DistributionInfo,
    pub passed: bool,
    pub summary: ReportSummary,
    pub verdicts: Vec<VerificationVerdict>,
    /// SHA-256 over the ordered verdicts; equal across idempotent runs
    pub verdict_digest: String,
}

/// Build a FullResult for one run
pub fn build_full_result(report: &Report, distribution: &LibraryDistribution) -> FullResult {
    let library = &distribution.library;

    FullResult {
        tool: ToolInfo {
            name: TOOL_NAME,
            version: env!("CARGO_PKG_VERSION"),
        },
        run_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        distribution: DistributionInfo {
            library: library.name.clone(),
            full_version: library.full_version.clone(),
            soname: library.soname(),
            runtime_packages: vec![
                library.name.clone(),
                format!("{}{}", library.name, library.major_version),
            ],
            development_package: library.dev_package(),
            strict: distribution.strict,
        },
        passed: report.passed(),
        summary: report.summary(),
        verdicts: report.verdicts().to_vec(),
        verdict_digest: report.verdict_digest(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_report;

    #[test]
    fn test_full_result() {
        let report = sample_report();
        let result = build_full_result(&report, &LibraryDistribution::default());

        assert!(!result.passed);
        assert_eq!(result.distribution.soname, "libcalc.so.1");
        assert_eq!(result.verdicts.len(), 2);
        assert_eq!(result.verdict_digest, report.verdict_digest());

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["verdicts"][1]["failure_kind"], "unmet");
        assert_eq!(value["verdicts"][1]["severity"], "failure");
        assert!(value["verdicts"][0].get("reason").is_none());
    }

    #[test]
    fn test_runs_get_distinct_ids() {
        let report = sample_report();
        let distribution = LibraryDistribution::default();

        let first = build_full_result(&report, &distribution);
        let second = build_full_result(&report, &distribution);
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(first.verdict_digest, second.verdict_digest);
    }
}
