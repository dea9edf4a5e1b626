//! Output generation module
//!
//! Provides builders for the output formats:
//! - Full results with every verdict, run metadata and digest
//! - Summary (counts and failures only)
//! - Console (human-readable)

mod console;
mod full;
mod summary;

pub use console::{print_progress_result, print_results};
pub use full::build_full_result;
pub use summary::build_summary;

use rule_kit::contracts::LibraryDistribution;
use rule_kit::execution_api::Report;

use crate::config::OutputFormat;

/// Tool identity embedded in every JSON output
pub(crate) const TOOL_NAME: &str = "libdist-verify";

/// Build output in the specified format
pub fn build_output(
    report: &Report,
    distribution: &LibraryDistribution,
    format: OutputFormat,
) -> Result<String, OutputError> {
    let json = match format {
        OutputFormat::Full => {
            let result = build_full_result(report, distribution);
            serde_json::to_string_pretty(&result)
                .map_err(|e| OutputError::Serialization(e.to_string()))?
        }
        OutputFormat::Summary => {
            let result = build_summary(report, distribution);
            serde_json::to_string_pretty(&result)
                .map_err(|e| OutputError::Serialization(e.to_string()))?
        }
    };
    Ok(json)
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during output generation
#[derive(Debug)]
pub enum OutputError {
    /// Failed to serialize result
    Serialization(String),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Serialization(msg) => write!(f, "Failed to serialize output: {}", msg),
        }
    }
}

impl std::error::Error for OutputError {}
