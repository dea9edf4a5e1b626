//! # Library Distribution Verifier
//!
//! Checks that a shared library has been packaged into runtime and
//! development `.deb` packages, installed, and consumed by a downstream
//! binary.
//!
//! ## Usage
//!
//! ```bash
//! # Verify the reference layout
//! libdist-verify
//!
//! # Verify a custom layout with strict link and ownership checks
//! libdist-verify --config libdist.toml --strict
//!
//! # Save a summary alongside the console report
//! libdist-verify --format summary -o summary.json
//! ```
//!
//! ## Output Formats
//!
//! - **full** (default): Every verdict, run id, timestamp and verdict digest
//! - **summary**: Pass/fail counts and failure reasons only

mod cli;
mod config;
mod output;
mod registry;
mod scanner;

use clap::Parser;
use cli::Cli;
use rule_kit::execution_api::{log_error, logging};

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if let Err(e) = logging::init_with_default_filter(cli.log_filter()) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(scanner::EXIT_ERROR);
    }

    let quiet = cli.quiet;
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            scanner::EXIT_ERROR
        }
    };

    // Always summarise logged problems on a non-zero exit
    if exit_code != scanner::EXIT_PASSED || !quiet {
        logging::print_cargo_style_summary();
    }

    std::process::exit(exit_code);
}

/// Load configuration and run the verification
fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let config = cli.into_config().map_err(|e| {
        log_error!(
            logging::codes::system::CONFIG_ERROR,
            "Configuration rejected",
            "error" => &e
        );
        e
    })?;

    Ok(scanner::run_verification(&config)?)
}
