//! Console output formatting
//!
//! Provides formatted console output for verification results.

use rule_kit::contracts::LibraryDistribution;
use rule_kit::execution_api::{Report, Severity, VerificationVerdict};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Print verification results to console in a human-readable format
pub fn print_results(report: &Report, distribution: &LibraryDistribution) {
    println!();
    println!("╔═══════════════════════════════════════════════════════════════════════════════╗");
    println!("║                           VERIFICATION RESULTS                                ║");
    println!("╚═══════════════════════════════════════════════════════════════════════════════╝");
    println!();

    print_distribution(report, distribution);
    print_summary_table(report);
}

/// Print the per-rule listing
fn print_distribution(report: &Report, distribution: &LibraryDistribution) {
    let library = &distribution.library;
    let (status_color, status_icon, status_text) = if report.passed() {
        (GREEN, "✓", "PASS")
    } else {
        (RED, "✗", "FAIL")
    };

    println!("┌───────────────────────────────────────────────────────────────────────────────┐");
    println!("│ Library:     {} {}", library.name, library.full_version);
    println!("├───────────────────────────────────────────────────────────────────────────────┤");
    println!(
        "│ Status:      {}{} {}{}",
        status_color, status_icon, status_text, RESET
    );
    println!("│ SONAME:      {}", library.soname());
    println!("│ Mode:        {}", if distribution.strict { "strict" } else { "relaxed" });
    println!("├───────────────────────────────────────────────────────────────────────────────┤");

    for verdict in report.verdicts() {
        let mark = if verdict.passed {
            format!("{}PASS{}", GREEN, RESET)
        } else if verdict.severity == Severity::Error {
            format!("{}ERR {}", YELLOW, RESET)
        } else {
            format!("{}FAIL{}", RED, RESET)
        };
        println!("│ [{}] {:<24} {}", mark, verdict.rule_id, verdict.title);

        if let Some(reason) = &verdict.reason {
            println!("│         └─ {}", truncate(reason, 66));
        }
    }

    println!("└───────────────────────────────────────────────────────────────────────────────┘");
    println!();
}

/// Print summary table
fn print_summary_table(report: &Report) {
    let summary = report.summary();
    let errors = report
        .verdicts()
        .iter()
        .filter(|v| !v.passed && v.severity == Severity::Error)
        .count();

    println!("╔═══════════════════════════════════════════════════════════════════════════════╗");
    println!("║                                 SUMMARY                                       ║");
    println!("╠═══════════════════════════════════════════════════════════════════════════════╣");
    println!("║                                                                               ║");
    println!(
        "║   Total Rules:    {:3}                                                         ║",
        summary.total
    );
    println!("║   {}Passed:{}         {:3}                                                         ║", GREEN, RESET, summary.passed);
    println!("║   {}Failed:{}         {:3}                                                         ║", RED, RESET, summary.failed);
    if errors > 0 {
        println!("║   {}Probe errors:{}   {:3}                                                         ║", YELLOW, RESET, errors);
    }
    println!("║                                                                               ║");
    println!("║   Digest: {}...                                                ║", &report.verdict_digest()[..16]);
    println!("║                                                                               ║");
    println!("╚═══════════════════════════════════════════════════════════════════════════════╝");
    println!();
}

/// Print a compact single-line result for progress output
pub fn print_progress_result(num: usize, total: usize, verdict: &VerificationVerdict) {
    let (color, icon) = if verdict.passed { (GREEN, "✓") } else { (RED, "✗") };

    println!(
        "[{:2}/{}] {}{}{} {}",
        num, total, color, icon, RESET, verdict.rule_id
    );
    if let Some(reason) = &verdict.reason {
        println!("        └─ {}", reason);
    }
}

/// Shorten `text` to at most `max` characters
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }
}
