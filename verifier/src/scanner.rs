//! Core verification logic
//!
//! Runs the rule registry against the configured distribution, renders the
//! report and maps it to an exit code.

use std::path::Path;
use std::time::Instant;

use rule_kit::contracts::LibraryDistribution;
use rule_kit::execution_api::{log_error, log_info, logging, Report};

use crate::config::RunConfig;
use crate::output;
use crate::registry;

/// Exit code when every rule passed
pub const EXIT_PASSED: i32 = 0;
/// Exit code when at least one rule failed
pub const EXIT_FAILED: i32 = 1;
/// Exit code for configuration and execution errors
pub const EXIT_ERROR: i32 = 2;

/// Run a verification with the given configuration
pub fn run_verification(config: &RunConfig) -> Result<i32, RunError> {
    let start = Instant::now();
    let distribution = &config.distribution;

    log_info!(
        "Starting verification",
        "library" => &distribution.library.name,
        "strict" => distribution.strict
    );
    if !config.quiet {
        println!();
        println!("Library Distribution Verifier v{}", env!("CARGO_PKG_VERSION"));
        match &config.config_path {
            Some(path) => println!("Verifying {} ({})", distribution.library.name, path.display()),
            None => println!("Verifying {} (reference layout)", distribution.library.name),
        }
        println!();
    }

    let report = execute(distribution, config.quiet);
    let duration = start.elapsed();

    if !config.quiet {
        output::print_results(&report, distribution);
        print_execution_info(duration, config);
    }

    if let Some(output_path) = &config.output_file {
        save_output(&report, distribution, config, output_path)?;

        if !config.quiet {
            println!("Results saved to: {}", output_path.display());
            println!();
        }
    }

    Ok(exit_code(&report))
}

/// Evaluate every rule against `distribution`
fn execute(distribution: &LibraryDistribution, quiet: bool) -> Report {
    let services = registry::create_services(distribution);
    let report = services.registry.verify(&services.context(distribution));

    if !quiet {
        let total = report.verdicts().len();
        for (index, verdict) in report.verdicts().iter().enumerate() {
            output::print_progress_result(index + 1, total, verdict);
        }
    }

    report
}

/// Exit code for a completed report
pub fn exit_code(report: &Report) -> i32 {
    if report.passed() {
        EXIT_PASSED
    } else {
        EXIT_FAILED
    }
}

/// Save output to file
fn save_output(
    report: &Report,
    distribution: &LibraryDistribution,
    config: &RunConfig,
    output_path: &Path,
) -> Result<(), RunError> {
    let json = output::build_output(report, distribution, config.output_format).map_err(|e| {
        log_error!(
            logging::codes::system::OUTPUT_ERROR,
            "Failed to build output",
            "error" => &e
        );
        RunError::Output(e)
    })?;

    std::fs::write(output_path, &json)
        .map_err(|e| RunError::WriteFile(output_path.display().to_string(), e))?;

    Ok(())
}

/// Print execution information
fn print_execution_info(duration: std::time::Duration, config: &RunConfig) {
    println!("────────────────────────────────────────────────────────────────────────────────");
    println!("  Duration:     {:.2}s", duration.as_secs_f64());
    if let Some(output_path) = &config.output_file {
        println!(
            "  Output:       {} ({})",
            output_path.display(),
            config.output_format
        );
    }
    println!("────────────────────────────────────────────────────────────────────────────────");
    println!();
}

/// Errors that can occur during a verification run
#[derive(Debug)]
pub enum RunError {
    /// Failed to generate output
    Output(output::OutputError),
    /// Failed to write output file
    WriteFile(String, std::io::Error),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Output(e) => write!(f, "Output generation failed: {}", e),
            RunError::WriteFile(path, e) => write!(f, "Failed to write {}: {}", path, e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Output(e) => Some(e),
            RunError::WriteFile(_, e) => Some(e),
        }
    }
}
