//! # Package Artifacts
//!
//! Role classification for package names and `.deb` file names.
//!
//! Matching is exact or boundary-based: `libcalc-devtools` is not the
//! development package and `libcalcextra` is not the runtime package.

use serde::Serialize;

use super::distribution::LibraryIdentity;

/// ABI-transition suffixes Debian appends to runtime package names
const RUNTIME_ABI_SUFFIXES: &[&str] = &["t64", "v5"];

/// Which half of the distribution a package provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageRole {
    /// Versioned shared object and SONAME link
    Runtime,
    /// Header, unversioned link and pkg-config descriptor
    Development,
}

impl std::fmt::Display for PackageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageRole::Runtime => write!(f, "runtime"),
            PackageRole::Development => write!(f, "development"),
        }
    }
}

/// Whether `name` is the runtime package: `libcalc`, `libcalc1` or `libcalc1t64`
pub fn is_runtime_package_name(name: &str, identity: &LibraryIdentity) -> bool {
    let Some(rest) = name.strip_prefix(identity.name.as_str()) else {
        return false;
    };

    if rest.is_empty() {
        return true;
    }

    let Some(abi) = rest.strip_prefix(identity.major_version.to_string().as_str()) else {
        return false;
    };

    abi.is_empty() || RUNTIME_ABI_SUFFIXES.contains(&abi)
}

/// Role of a package name for this library, if it plays one
pub fn classify_package_name(name: &str, identity: &LibraryIdentity) -> Option<PackageRole> {
    if name == identity.dev_package() {
        Some(PackageRole::Development)
    } else if is_runtime_package_name(name, identity) {
        Some(PackageRole::Runtime)
    } else {
        None
    }
}

/// A built `.deb` file: `<package>_<version>[_<arch>].deb`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageArtifact {
    pub file_name: String,
    pub package_name: String,
    pub version: Option<String>,
    pub architecture: Option<String>,
    pub role: Option<PackageRole>,
}

impl PackageArtifact {
    /// Parse a file name; `None` if it is not a `.deb`
    pub fn from_file_name(file_name: &str, identity: &LibraryIdentity) -> Option<Self> {
        let stem = file_name.strip_suffix(".deb")?;
        let mut parts = stem.split('_');

        let package_name = parts.next().filter(|p| !p.is_empty())?.to_string();
        let version = parts.next().map(str::to_string);
        let architecture = parts.next().map(str::to_string);
        let role = classify_package_name(&package_name, identity);

        Some(Self {
            file_name: file_name.to_string(),
            package_name,
            version,
            architecture,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> LibraryIdentity {
        LibraryIdentity::default()
    }

    #[test]
    fn test_runtime_names() {
        let id = identity();

        assert!(is_runtime_package_name("libcalc", &id));
        assert!(is_runtime_package_name("libcalc1", &id));
        assert!(is_runtime_package_name("libcalc1t64", &id));
        assert!(!is_runtime_package_name("libcalc2", &id));
        assert!(!is_runtime_package_name("libcalc-dev", &id));
        assert!(!is_runtime_package_name("libcalculator", &id));
    }

    #[test]
    fn test_dev_name_is_exact() {
        let id = identity();

        assert_eq!(
            classify_package_name("libcalc-dev", &id),
            Some(PackageRole::Development)
        );
        assert_eq!(classify_package_name("libcalc-devtools", &id), None);
        assert_eq!(classify_package_name("libcalc-doc", &id), None);
    }

    #[test]
    fn test_parse_deb_file_names() {
        let id = identity();

        let runtime = PackageArtifact::from_file_name("libcalc1_1.0.0.deb", &id).unwrap();
        assert_eq!(runtime.package_name, "libcalc1");
        assert_eq!(runtime.version.as_deref(), Some("1.0.0"));
        assert_eq!(runtime.architecture, None);
        assert_eq!(runtime.role, Some(PackageRole::Runtime));

        let dev = PackageArtifact::from_file_name("libcalc-dev_1:1.0.0-2_amd64.deb", &id).unwrap();
        assert_eq!(dev.role, Some(PackageRole::Development));
        assert_eq!(dev.architecture.as_deref(), Some("amd64"));
        assert_eq!(dev.version.as_deref(), Some("1:1.0.0-2"));

        assert!(PackageArtifact::from_file_name("libcalc1_1.0.0.tar.gz", &id).is_none());
    }
}
