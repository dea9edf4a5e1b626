//! Configuration types for the verifier
//!
//! A run is configured from an optional TOML file deserialised into a
//! [`LibraryDistribution`] (every field defaults to the reference layout)
//! and then adjusted by command-line overrides.

use std::path::{Path, PathBuf};

use rule_kit::contracts::{DistributionError, LibraryDistribution};

/// Output format for verification results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Every verdict plus run metadata and digest
    Full,
    /// Counts and failures only
    Summary,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Full => write!(f, "full"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

/// Configuration for a verification run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Distribution under verification
    pub distribution: LibraryDistribution,

    /// Configuration file the distribution was loaded from, if any
    pub config_path: Option<PathBuf>,

    /// Output file path (None means console-only output)
    pub output_file: Option<PathBuf>,

    /// Output format
    pub output_format: OutputFormat,

    /// Suppress console output
    pub quiet: bool,
}

/// Command-line adjustments applied on top of the file
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub strict: bool,
    pub timeout_secs: Option<u64>,
}

/// Load the distribution from `path`, or the reference layout when absent
pub fn load_distribution(
    path: Option<&Path>,
    overrides: Overrides,
) -> Result<LibraryDistribution, ConfigError> {
    let mut distribution = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::Read(path.display().to_string(), e))?;
            parse_distribution(&text)
                .map_err(|e| ConfigError::Parse(path.display().to_string(), e))?
        }
        None => LibraryDistribution::default(),
    };

    if overrides.strict {
        distribution.strict = true;
    }
    if let Some(secs) = overrides.timeout_secs {
        distribution.consumer.timeout_secs = secs;
    }

    distribution.validate().map_err(ConfigError::Invalid)?;
    Ok(distribution)
}

/// Parse TOML text into a distribution
pub fn parse_distribution(text: &str) -> Result<LibraryDistribution, toml::de::Error> {
    toml::from_str(text)
}

/// Errors loading the run configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    Read(String, std::io::Error),
    /// Configuration file is not valid TOML for a distribution
    Parse(String, toml::de::Error),
    /// Values violate a distribution invariant
    Invalid(DistributionError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(path, e) => write!(f, "Failed to read {}: {}", path, e),
            ConfigError::Parse(path, e) => write!(f, "Invalid configuration in {}: {}", path, e),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
            ConfigError::Invalid(e) => Some(e),
        }
    }
}
