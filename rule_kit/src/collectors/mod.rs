//! # Data Collectors Module
//!
//! Read-only access to the installed system:
//! - `filesystem`: path existence, file kinds and versioned-library globbing
//! - `command`: whitelisted, time-bounded subprocess execution
//! - `packages`: package database and pkg-config queries
//! - `pkg_config`: direct `.pc` descriptor resolution

pub mod command;
pub mod filesystem;
pub mod packages;
pub mod pkg_config;

pub use command::{CommandOutput, LaunchError, SubprocessOracle, SystemCommandExecutor, DEFAULT_TIMEOUT};
pub use filesystem::{FileSystemCollector, FilesystemProbe, ProbeError, VersionedLibraries, VersionedLibrary};
pub use packages::{DpkgCollector, PackageMetadataReader, PkgConfigMode, QueryError};
pub use pkg_config::{find_descriptor, DescriptorError, PcDescriptor};
