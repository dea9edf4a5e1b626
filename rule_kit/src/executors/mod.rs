//! # Distribution Rules Module
//!
//! Each rule checks one packaging-contract condition against a
//! [`RuleContext`] and either passes or fails with a specific diagnostic.
//! Rules never abort a run; the registry in `execution_api` evaluates every
//! one of them.
//!
//! - `packaging`: source manifest and built `.deb` artifacts
//! - `install`: package registration and installed files
//! - `linkage`: pkg-config resolution and the downstream consumer

pub mod install;
pub mod linkage;
pub mod packaging;

pub use install::{
    FileOwnershipRule, HeaderInstallationRule, PackageRegistrationRule, SharedObjectPlacementRule,
    SonameFormatRule, UnversionedLinkRule,
};
pub use linkage::{
    ConsumerExecutionRule, ConsumerLinkageRule, PkgConfigResolutionRule, VerificationOutputRule,
};
pub use packaging::{ArtifactPartitionRule, BuildScriptRule, ChangelogPresenceRule, ManifestPresenceRule};

use serde::Serialize;
use std::path::Path;

use crate::collectors::{
    FilesystemProbe, LaunchError, PackageMetadataReader, ProbeError, QueryError, SubprocessOracle,
};
use crate::contracts::LibraryDistribution;

/// Everything a rule may observe
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub distribution: &'a LibraryDistribution,
    pub filesystem: &'a dyn FilesystemProbe,
    pub packages: &'a dyn PackageMetadataReader,
    pub oracle: &'a dyn SubprocessOracle,
}

/// One packaging-contract check
pub trait DistributionRule: Send + Sync {
    /// Stable identifier, e.g. `soname-format`
    fn rule_id(&self) -> &'static str;

    /// Human-readable title
    fn title(&self) -> &'static str;

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError>;
}

/// Why a rule did not pass
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A required path or entry is absent
    #[error("{0}")]
    NotFound(String),

    /// The checked condition does not hold
    #[error("{0}")]
    Unmet(String),

    /// An artifact exists but cannot be interpreted
    #[error("{0}")]
    Malformed(String),

    #[error("filesystem probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("{0}")]
    Launch(#[from] LaunchError),

    #[error("package query failed: {0}")]
    Query(#[from] QueryError),
}

/// Verdict classification of a [`RuleError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Unmet,
    MalformedArtifact,
    ProbeError,
    LaunchError,
    QueryError,
}

/// How serious a verdict is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Passed, or failed on the checked condition
    Failure,
    /// Failed because the system could not be observed
    Error,
}

impl RuleError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            RuleError::NotFound(_) => FailureKind::NotFound,
            RuleError::Unmet(_) => FailureKind::Unmet,
            RuleError::Malformed(_) => FailureKind::MalformedArtifact,
            RuleError::Probe(_) => FailureKind::ProbeError,
            RuleError::Launch(_) => FailureKind::LaunchError,
            RuleError::Query(_) => FailureKind::QueryError,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RuleError::Probe(_) => Severity::Error,
            _ => Severity::Failure,
        }
    }
}

/// Comma-separated paths for diagnostics
fn display_paths<P: AsRef<Path>>(paths: &[P]) -> String {
    paths
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
