//! # Library Distribution
//!
//! The unit under verification: where the library's source tree, packages,
//! installed files and consumer live, and which names the packaging
//! contract derives from the library identity. Every field defaults to the
//! reference `libcalc` layout so a configuration file only lists overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::DistributionError;

/// Name and version of the packaged library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryIdentity {
    /// Base name, including the `lib` prefix (e.g. `libcalc`)
    pub name: String,
    /// SONAME major version
    pub major_version: u32,
    /// Full `X.Y.Z` version of the real shared object
    pub full_version: String,
    /// Public header file name
    pub header: String,
}

impl Default for LibraryIdentity {
    fn default() -> Self {
        Self {
            name: "libcalc".to_string(),
            major_version: 1,
            full_version: "1.0.0".to_string(),
            header: "calc.h".to_string(),
        }
    }
}

impl LibraryIdentity {
    /// Name passed to the linker as `-l<short>`
    pub fn short_name(&self) -> &str {
        self.name.strip_prefix("lib").unwrap_or(&self.name)
    }

    /// Unversioned development-facing name, `libcalc.so`
    pub fn linker_name(&self) -> String {
        format!("{}.so", self.name)
    }

    /// `libcalc.so.1`
    pub fn soname(&self) -> String {
        format!("{}.so.{}", self.name, self.major_version)
    }

    /// `libcalc.so.1.0.0`
    pub fn real_name(&self) -> String {
        format!("{}.so.{}", self.name, self.full_version)
    }

    /// `libcalc-dev`
    pub fn dev_package(&self) -> String {
        format!("{}-dev", self.name)
    }

    /// `libcalc.pc`
    pub fn pc_file_name(&self) -> String {
        format!("{}.pc", self.name)
    }

    /// Major component parsed out of `full_version`
    pub fn full_version_major(&self) -> Option<u32> {
        self.full_version.split('.').next()?.parse().ok()
    }
}

/// How pkg-config queries are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PkgConfigBackend {
    /// Run the system `pkg-config` tool
    #[default]
    Tool,
    /// Resolve `<name>.pc` on the search path directly
    Descriptor,
}

/// pkg-config lookup settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PkgConfigSettings {
    /// Descriptor name queried with `pkg-config <name>`
    pub name: String,
    /// Directories searched for `.pc` files
    pub search_path: Vec<PathBuf>,
    pub backend: PkgConfigBackend,
}

impl Default for PkgConfigSettings {
    fn default() -> Self {
        Self {
            name: "libcalc".to_string(),
            search_path: vec![
                PathBuf::from("/usr/lib/pkgconfig"),
                PathBuf::from("/usr/share/pkgconfig"),
                PathBuf::from("/usr/lib/x86_64-linux-gnu/pkgconfig"),
                PathBuf::from("/usr/lib/aarch64-linux-gnu/pkgconfig"),
            ],
            backend: PkgConfigBackend::Tool,
        }
    }
}

impl PkgConfigSettings {
    /// Search path joined for `PKG_CONFIG_PATH`
    pub fn search_path_env(&self) -> String {
        self.search_path
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Arithmetic family an expected consumer result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl ResultKind {
    /// Additive results satisfy the additive requirement of the output check
    pub fn is_additive(self) -> bool {
        matches!(self, ResultKind::Addition | ResultKind::Subtraction)
    }

    pub fn is_multiplicative(self) -> bool {
        matches!(self, ResultKind::Multiplication | ResultKind::Division)
    }
}

impl std::fmt::Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultKind::Addition => write!(f, "addition"),
            ResultKind::Subtraction => write!(f, "subtraction"),
            ResultKind::Multiplication => write!(f, "multiplication"),
            ResultKind::Division => write!(f, "division"),
        }
    }
}

/// A result the consumer is expected to print
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedResult {
    pub kind: ResultKind,
    /// Full printed line, e.g. `10 + 5 = 15`
    pub expression: String,
    /// Bare computed value, accepted as a standalone token
    pub value: String,
}

impl ExpectedResult {
    pub fn new(kind: ResultKind, expression: &str, value: &str) -> Self {
        Self {
            kind,
            expression: expression.to_string(),
            value: value.to_string(),
        }
    }
}

/// Consumer program settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerSettings {
    pub binary: PathBuf,
    /// Captured consumer output checked for expected results
    pub output_file: PathBuf,
    pub expected_results: Vec<ExpectedResult>,
    /// Bound on each subprocess call, in seconds
    pub timeout_secs: u64,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("/app/consumer/consumer"),
            output_file: PathBuf::from("/app/verification_output.txt"),
            expected_results: vec![
                ExpectedResult::new(ResultKind::Addition, "10 + 5 = 15", "15"),
                ExpectedResult::new(ResultKind::Multiplication, "10 * 5 = 50", "50"),
            ],
            timeout_secs: 5,
        }
    }
}

impl ConsumerSettings {
    /// Directory the consumer is run from
    pub fn working_dir(&self) -> Option<&Path> {
        self.binary.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

/// One library distribution instance under verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryDistribution {
    pub library: LibraryIdentity,
    /// Library source tree containing `debian/`
    pub source_root: PathBuf,
    /// Directory the built `.deb` files were written to
    pub artifact_dir: PathBuf,
    /// Architecture-qualified library directories, searched in order
    pub library_dirs: Vec<PathBuf>,
    /// System include directory the header is installed into
    pub include_dir: PathBuf,
    pub pkg_config: PkgConfigSettings,
    pub consumer: ConsumerSettings,
    /// Require a real symlink chain and a clean file-ownership partition
    pub strict: bool,
}

impl Default for LibraryDistribution {
    fn default() -> Self {
        Self {
            library: LibraryIdentity::default(),
            source_root: PathBuf::from("/app/libcalc"),
            artifact_dir: PathBuf::from("/app"),
            library_dirs: vec![
                PathBuf::from("/usr/lib"),
                PathBuf::from("/usr/lib/x86_64-linux-gnu"),
                PathBuf::from("/usr/lib/aarch64-linux-gnu"),
            ],
            include_dir: PathBuf::from("/usr/include"),
            pkg_config: PkgConfigSettings::default(),
            consumer: ConsumerSettings::default(),
            strict: false,
        }
    }
}

impl LibraryDistribution {
    /// Packaging manifest directory, `<source_root>/debian`
    pub fn manifest_dir(&self) -> PathBuf {
        self.source_root.join("debian")
    }

    pub fn control_path(&self) -> PathBuf {
        self.manifest_dir().join("control")
    }

    pub fn rules_path(&self) -> PathBuf {
        self.manifest_dir().join("rules")
    }

    pub fn changelog_path(&self) -> PathBuf {
        self.manifest_dir().join("changelog")
    }

    pub fn header_path(&self) -> PathBuf {
        self.include_dir.join(&self.library.header)
    }

    /// Check the configuration invariants before any rule runs
    pub fn validate(&self) -> Result<(), DistributionError> {
        if self.library.name.trim().is_empty() {
            return Err(DistributionError::InvalidField {
                field: "library.name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let components: Vec<&str> = self.library.full_version.split('.').collect();
        let numeric = components.len() == 3
            && components
                .iter()
                .all(|c| !c.is_empty() && c.chars().all(|ch| ch.is_ascii_digit()));
        if !numeric {
            return Err(DistributionError::InvalidField {
                field: "library.full_version".to_string(),
                reason: format!(
                    "'{}' is not a dotted numeric triple",
                    self.library.full_version
                ),
            });
        }

        match self.library.full_version_major() {
            Some(major) if major == self.library.major_version => {}
            _ => {
                return Err(DistributionError::VersionMismatch {
                    full_version: self.library.full_version.clone(),
                    major_version: self.library.major_version,
                })
            }
        }

        if self.library_dirs.is_empty() {
            return Err(DistributionError::InvalidField {
                field: "library_dirs".to_string(),
                reason: "at least one library directory is required".to_string(),
            });
        }

        let expected = &self.consumer.expected_results;
        if !expected.iter().any(|r| r.kind.is_additive())
            || !expected.iter().any(|r| r.kind.is_multiplicative())
        {
            return Err(DistributionError::InvalidField {
                field: "consumer.expected_results".to_string(),
                reason: "need at least one additive and one multiplicative result".to_string(),
            });
        }

        if self.consumer.timeout_secs == 0 {
            return Err(DistributionError::InvalidField {
                field: "consumer.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
