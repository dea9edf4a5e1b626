//! Summary builder
//!
//! Builds minimal summary output with pass/fail counts.

use rule_kit::contracts::LibraryDistribution;
use rule_kit::execution_api::Report;

use super::TOOL_NAME;

/// Build a summary JSON from the report
pub fn build_summary(report: &Report, distribution: &LibraryDistribution) -> serde_json::Value {
    let summary = report.summary();

    let failures: Vec<serde_json::Value> = summary
        .failures
        .iter()
        .map(|(rule_id, reason)| {
            serde_json::json!({
                "rule_id": rule_id,
                "reason": reason
            })
        })
        .collect();

    serde_json::json!({
        "tool": {
            "name": TOOL_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "library": distribution.library.name,
        "passed": report.passed(),
        "summary": {
            "total": summary.total,
            "passed": summary.passed,
            "failed": summary.failed
        },
        "failures": failures
    })
}
