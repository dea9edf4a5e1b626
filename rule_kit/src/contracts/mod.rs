//! # Distribution Contracts Module
//!
//! The packaging contract's data model:
//! - `distribution`: the library distribution under test and its layout
//! - `manifest`: `debian/control` parsing
//! - `artifacts`: package roles and `.deb` file names

pub mod artifacts;
pub mod distribution;
pub mod manifest;

pub use artifacts::{classify_package_name, is_runtime_package_name, PackageArtifact, PackageRole};
pub use distribution::{
    ConsumerSettings, ExpectedResult, LibraryDistribution, LibraryIdentity, PkgConfigBackend,
    PkgConfigSettings, ResultKind,
};
pub use manifest::{ManifestStanza, PackagingManifest};

/// Distribution model errors
#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("full_version '{full_version}' does not belong to SONAME major {major_version}")]
    VersionMismatch {
        full_version: String,
        major_version: u32,
    },

    #[error("Malformed control file at line {line}: {reason}")]
    MalformedManifest { line: usize, reason: String },
}
