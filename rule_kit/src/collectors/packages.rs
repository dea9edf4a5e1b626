//! # Package Metadata Reader
//!
//! Answers installed-package and pkg-config questions the way a downstream
//! consumer's build would: through the package database and pkg-config,
//! never by re-reading the packaging manifest.
//!
//! The installed-package listing is queried once and cached; installed
//! state is assumed not to change while a verification run is in progress.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use super::command::{LaunchError, SubprocessOracle};
use super::filesystem::{FilesystemProbe, ProbeError};
use super::pkg_config::{find_descriptor, DescriptorError, PcDescriptor};
use crate::contracts::{PkgConfigBackend, PkgConfigSettings};

/// Status abbreviations counted as installed (`ii`, or held `hi`)
const INSTALLED_STATUSES: &[&str] = &["ii", "hi"];

/// pkg-config query kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkgConfigMode {
    Exists,
    CFlags,
    Libs,
}

impl PkgConfigMode {
    pub fn flag(self) -> &'static str {
        match self {
            PkgConfigMode::Exists => "--exists",
            PkgConfigMode::CFlags => "--cflags",
            PkgConfigMode::Libs => "--libs",
        }
    }
}

/// Package metadata query errors
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("pkg-config descriptor '{name}' not found")]
    DescriptorNotFound { name: String },

    #[error("Malformed descriptor {}: {source}", path.display())]
    MalformedDescriptor {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },

    #[error("Package '{package}' is not installed")]
    PackageNotInstalled { package: String },

    #[error("'{command}' exited with status {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Installed-package database and library metadata resolver
pub trait PackageMetadataReader: Send + Sync {
    /// Names of every installed package
    fn list_installed_packages(&self) -> Result<BTreeSet<String>, QueryError>;

    /// `Exists` yields an empty string on success; the others the raw flags
    fn query_pkg_config(&self, library: &str, mode: PkgConfigMode) -> Result<String, QueryError>;

    /// Paths owned by an installed package
    fn list_package_files(&self, package: &str) -> Result<Vec<PathBuf>, QueryError>;
}

/// Parse `dpkg-query -W -f='${binary:Package}\t${db:Status-Abbrev}\n'` output
pub fn parse_installed_packages(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let (name, status) = line.split_once('\t')?;
            let status = status.trim();
            if !INSTALLED_STATUSES.iter().any(|s| status.starts_with(s)) {
                return None;
            }
            let name = name.split(':').next()?.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Reader backed by `dpkg-query` and pkg-config
pub struct DpkgCollector {
    id: String,
    oracle: Arc<dyn SubprocessOracle>,
    probe: Arc<dyn FilesystemProbe>,
    pkg_config: PkgConfigSettings,
    installed: OnceLock<BTreeSet<String>>,
}

impl DpkgCollector {
    pub fn new(
        oracle: Arc<dyn SubprocessOracle>,
        probe: Arc<dyn FilesystemProbe>,
        pkg_config: PkgConfigSettings,
    ) -> Self {
        Self {
            id: "dpkg_collector".to_string(),
            oracle,
            probe,
            pkg_config,
            installed: OnceLock::new(),
        }
    }

    pub fn collector_id(&self) -> &str {
        &self.id
    }

    fn query_with_tool(&self, library: &str, mode: PkgConfigMode) -> Result<String, QueryError> {
        let output = self.oracle.run("pkg-config", &[mode.flag(), library], None)?;

        if !output.success() {
            return Err(match mode {
                PkgConfigMode::Exists => QueryError::DescriptorNotFound {
                    name: library.to_string(),
                },
                _ => QueryError::CommandFailed {
                    command: format!("pkg-config {} {}", mode.flag(), library),
                    exit_code: output.exit_code,
                    stderr: output.stderr.trim().to_string(),
                },
            });
        }

        Ok(match mode {
            PkgConfigMode::Exists => String::new(),
            _ => output.stdout.trim().to_string(),
        })
    }

    fn query_descriptor(&self, library: &str, mode: PkgConfigMode) -> Result<String, QueryError> {
        let path = find_descriptor(self.probe.as_ref(), &self.pkg_config.search_path, library)?
            .ok_or_else(|| QueryError::DescriptorNotFound {
                name: library.to_string(),
            })?;

        let text = self.probe.read_to_string(&path)?;
        let descriptor = PcDescriptor::parse(&text).map_err(|source| {
            QueryError::MalformedDescriptor {
                path: path.clone(),
                source,
            }
        })?;

        let field = match mode {
            PkgConfigMode::Exists => return Ok(String::new()),
            PkgConfigMode::CFlags => "Cflags",
            PkgConfigMode::Libs => "Libs",
        };

        descriptor
            .field(field)
            .map(Option::unwrap_or_default)
            .map_err(|source| QueryError::MalformedDescriptor { path, source })
    }
}

impl PackageMetadataReader for DpkgCollector {
    fn list_installed_packages(&self) -> Result<BTreeSet<String>, QueryError> {
        if let Some(cached) = self.installed.get() {
            return Ok(cached.clone());
        }

        let output = self.oracle.run(
            "dpkg-query",
            &["-W", "-f=${binary:Package}\t${db:Status-Abbrev}\n"],
            None,
        )?;

        if !output.success() {
            return Err(QueryError::CommandFailed {
                command: "dpkg-query -W".to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let packages = parse_installed_packages(&output.stdout);
        crate::log_debug!("Installed packages listed", "count" => packages.len());

        let _ = self.installed.set(packages.clone());
        Ok(packages)
    }

    fn query_pkg_config(&self, library: &str, mode: PkgConfigMode) -> Result<String, QueryError> {
        match self.pkg_config.backend {
            PkgConfigBackend::Tool => self.query_with_tool(library, mode),
            PkgConfigBackend::Descriptor => self.query_descriptor(library, mode),
        }
    }

    fn list_package_files(&self, package: &str) -> Result<Vec<PathBuf>, QueryError> {
        let output = self.oracle.run("dpkg-query", &["-L", package], None)?;

        if !output.success() {
            return Err(QueryError::PackageNotInstalled {
                package: package.to_string(),
            });
        }

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('/'))
            .map(PathBuf::from)
            .collect())
    }
}
