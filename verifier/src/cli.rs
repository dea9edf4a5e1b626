//! Command-line interface parsing
//!
//! Argument definitions and their conversion into a [`RunConfig`].

use std::path::PathBuf;

use clap::Parser;

use crate::config::{self, ConfigError, OutputFormat, Overrides, RunConfig};

/// Verify a Debian-packaged shared library distribution.
#[derive(Parser, Debug)]
#[command(name = "libdist-verify")]
#[command(version, about)]
#[command(after_help = concat!(
    "BEHAVIOR:\n",
    "  Results are always printed to the console (unless --quiet is set).\n",
    "  Use --output to additionally save results to a JSON file.\n\n",
    "EXIT CODES:\n",
    "  0    All rules passed\n",
    "  1    One or more rules failed\n",
    "  2    Configuration or execution error\n\n",
    "EXAMPLES:\n",
    "  libdist-verify                                   # Reference layout, console only\n",
    "  libdist-verify --config libdist.toml --strict    # Custom layout, strict checks\n",
    "  libdist-verify --format summary -o summary.json  # Console + summary file\n",
    "  libdist-verify --quiet -o results.json           # File only, no console",
))]
pub struct Cli {
    /// TOML file describing the distribution [default: reference layout].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Format of the JSON written with --output.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Full)]
    pub format: OutputFormat,

    /// Write results to a JSON file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress console output.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Require a symlinked development link and a clean file-ownership partition.
    #[arg(long)]
    pub strict: bool,

    /// Bound on each subprocess call, in seconds.
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Log rule progress.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Default log filter implied by the flags
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "info"
        } else {
            "warn"
        }
    }

    /// Load the distribution and assemble the run configuration
    pub fn into_config(self) -> Result<RunConfig, ConfigError> {
        let overrides = Overrides {
            strict: self.strict,
            timeout_secs: self.timeout,
        };
        let distribution = config::load_distribution(self.config.as_deref(), overrides)?;

        Ok(RunConfig {
            distribution,
            config_path: self.config,
            output_file: self.output,
            output_format: self.format,
            quiet: self.quiet,
        })
    }
}
