//! # File System Probe
//!
//! Answers existence, symlink and permission questions about installed
//! paths without interpreting their content. "Not found" is a normal
//! negative answer; every other I/O failure surfaces as [`ProbeError`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem probe errors
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Access denied for {}: {source}", path.display())]
    AccessDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid UTF-8 text", path.display())]
    NotText { path: PathBuf },
}

impl ProbeError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => ProbeError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => ProbeError::AccessDenied {
                path: path.to_path_buf(),
                source,
            },
            io::ErrorKind::InvalidData => ProbeError::NotText {
                path: path.to_path_buf(),
            },
            _ => ProbeError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProbeError::NotFound { .. })
    }
}

/// A `<base>.so.<suffix>` entry found by [`FilesystemProbe::glob_versioned_libraries`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedLibrary {
    pub path: PathBuf,
    /// Everything after `<base>.so.`, e.g. `1` or `1.0.0`
    pub version_suffix: String,
}

impl VersionedLibrary {
    /// Dot-separated version components of the suffix
    pub fn components(&self) -> Vec<&str> {
        self.version_suffix.split('.').collect()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Lazy iterator over versioned shared objects in one directory
pub struct VersionedLibraries {
    dir: PathBuf,
    prefix: String,
    entries: Option<fs::ReadDir>,
}

impl VersionedLibraries {
    fn empty(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: String::new(),
            entries: None,
        }
    }
}

impl Iterator for VersionedLibraries {
    type Item = Result<VersionedLibrary, ProbeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.entries.as_mut()?;

        for entry in entries.by_ref() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => return Some(Err(ProbeError::from_io(&self.dir, e))),
            };

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            if let Some(suffix) = name.strip_prefix(self.prefix.as_str()) {
                if !suffix.is_empty() {
                    return Some(Ok(VersionedLibrary {
                        path: entry.path(),
                        version_suffix: suffix.to_string(),
                    }));
                }
            }
        }

        None
    }
}

/// Read-only view of the installed filesystem
pub trait FilesystemProbe: Send + Sync {
    /// Whether the path exists, following symlinks
    fn exists(&self, path: &Path) -> Result<bool, ProbeError>;

    /// Whether the path is a regular file with an execute bit set
    fn is_executable(&self, path: &Path) -> Result<bool, ProbeError>;

    /// Whether the path itself is a symlink (not followed)
    fn is_symlink(&self, path: &Path) -> Result<bool, ProbeError>;

    /// Whether the path resolves to a regular file
    fn is_regular_file(&self, path: &Path) -> Result<bool, ProbeError>;

    /// Whether the path resolves to a directory
    fn is_directory(&self, path: &Path) -> Result<bool, ProbeError>;

    /// Read a text file
    fn read_to_string(&self, path: &Path) -> Result<String, ProbeError>;

    /// Fully resolve a path through every symlink
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, ProbeError>;

    /// Entries named `<base>.so.<suffix>` in `dir`; missing `dir` is empty
    fn glob_versioned_libraries(
        &self,
        dir: &Path,
        base: &str,
    ) -> Result<VersionedLibraries, ProbeError>;

    /// Sorted file names in `dir` with the given prefix and suffix
    fn glob_files(&self, dir: &Path, prefix: &str, suffix: &str) -> Result<Vec<String>, ProbeError>;
}

/// Probe backed by `std::fs`
pub struct FileSystemCollector {
    id: String,
}

impl FileSystemCollector {
    pub fn new() -> Self {
        Self {
            id: "filesystem_collector".to_string(),
        }
    }

    pub fn collector_id(&self) -> &str {
        &self.id
    }

    /// stat() that maps NotFound to None
    fn metadata(&self, path: &Path) -> Result<Option<fs::Metadata>, ProbeError> {
        match fs::metadata(path) {
            Ok(m) => Ok(Some(m)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProbeError::from_io(path, e)),
        }
    }
}

impl Default for FileSystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesystemProbe for FileSystemCollector {
    fn exists(&self, path: &Path) -> Result<bool, ProbeError> {
        Ok(self.metadata(path)?.is_some())
    }

    fn is_executable(&self, path: &Path) -> Result<bool, ProbeError> {
        let Some(metadata) = self.metadata(path)? else {
            return Ok(false);
        };

        if !metadata.is_file() {
            return Ok(false);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Ok(metadata.permissions().mode() & 0o111 != 0)
        }

        #[cfg(not(unix))]
        {
            Ok(true)
        }
    }

    fn is_symlink(&self, path: &Path) -> Result<bool, ProbeError> {
        match fs::symlink_metadata(path) {
            Ok(m) => Ok(m.file_type().is_symlink()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ProbeError::from_io(path, e)),
        }
    }

    fn is_regular_file(&self, path: &Path) -> Result<bool, ProbeError> {
        Ok(self.metadata(path)?.map(|m| m.is_file()).unwrap_or(false))
    }

    fn is_directory(&self, path: &Path) -> Result<bool, ProbeError> {
        Ok(self.metadata(path)?.map(|m| m.is_dir()).unwrap_or(false))
    }

    fn read_to_string(&self, path: &Path) -> Result<String, ProbeError> {
        fs::read_to_string(path).map_err(|e| ProbeError::from_io(path, e))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, ProbeError> {
        fs::canonicalize(path).map_err(|e| ProbeError::from_io(path, e))
    }

    fn glob_versioned_libraries(
        &self,
        dir: &Path,
        base: &str,
    ) -> Result<VersionedLibraries, ProbeError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(VersionedLibraries::empty(dir))
            }
            Err(e) => return Err(ProbeError::from_io(dir, e)),
        };

        Ok(VersionedLibraries {
            dir: dir.to_path_buf(),
            prefix: format!("{}.so.", base),
            entries: Some(entries),
        })
    }

    fn glob_files(
        &self,
        dir: &Path,
        prefix: &str,
        suffix: &str,
    ) -> Result<Vec<String>, ProbeError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ProbeError::from_io(dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ProbeError::from_io(dir, e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            if name.starts_with(prefix)
                && name.ends_with(suffix)
                && self.is_regular_file(&entry.path())?
            {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_missing_path_is_negative_not_error() {
        let probe = FileSystemCollector::new();
        let missing = Path::new("/definitely/nonexistent/path/libcalc.so");

        assert!(!probe.exists(missing).unwrap());
        assert!(!probe.is_symlink(missing).unwrap());
        assert!(!probe.is_executable(missing).unwrap());
        assert!(probe.read_to_string(missing).unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_directory_globs_empty() {
        let probe = FileSystemCollector::new();
        let found: Vec<_> = probe
            .glob_versioned_libraries(Path::new("/definitely/nonexistent"), "libcalc")
            .unwrap()
            .collect();
        assert!(found.is_empty());
    }

    #[test]
    fn test_collector_id() {
        assert_eq!(FileSystemCollector::new().collector_id(), "filesystem_collector");
    }

    #[cfg(unix)]
    mod unix_tests {
        use super::*;
        use std::os::unix::fs::{symlink, PermissionsExt};

        #[test]
        fn test_executable_bit() {
            let dir = tempfile::tempdir().unwrap();
            let script = dir.path().join("rules");
            File::create(&script).unwrap();

            let probe = FileSystemCollector::new();
            assert!(!probe.is_executable(&script).unwrap());

            fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
            assert!(probe.is_executable(&script).unwrap());

            // Directories are never executable files
            assert!(!probe.is_executable(dir.path()).unwrap());
        }

        #[test]
        fn test_symlink_chain() {
            let dir = tempfile::tempdir().unwrap();
            let real = dir.path().join("libcalc.so.1.0.0");
            File::create(&real).unwrap();
            symlink("libcalc.so.1.0.0", dir.path().join("libcalc.so.1")).unwrap();
            symlink("libcalc.so.1", dir.path().join("libcalc.so")).unwrap();

            let probe = FileSystemCollector::new();
            let linker_name = dir.path().join("libcalc.so");

            assert!(probe.is_symlink(&linker_name).unwrap());
            assert!(!probe.is_symlink(&real).unwrap());
            assert!(probe.exists(&linker_name).unwrap());
            assert_eq!(
                probe.canonicalize(&linker_name).unwrap(),
                fs::canonicalize(&real).unwrap()
            );
        }

        #[test]
        fn test_dangling_symlink_does_not_exist() {
            let dir = tempfile::tempdir().unwrap();
            let link = dir.path().join("libcalc.so");
            symlink("libcalc.so.1", &link).unwrap();

            let probe = FileSystemCollector::new();
            assert!(probe.is_symlink(&link).unwrap());
            assert!(!probe.exists(&link).unwrap());
        }

        #[test]
        fn test_glob_versioned_libraries() {
            let dir = tempfile::tempdir().unwrap();
            File::create(dir.path().join("libcalc.so.1.0.0")).unwrap();
            symlink("libcalc.so.1.0.0", dir.path().join("libcalc.so.1")).unwrap();
            File::create(dir.path().join("libcalc.so")).unwrap();
            File::create(dir.path().join("libother.so.2")).unwrap();

            let probe = FileSystemCollector::new();
            let mut suffixes: Vec<String> = probe
                .glob_versioned_libraries(dir.path(), "libcalc")
                .unwrap()
                .map(|lib| lib.unwrap().version_suffix)
                .collect();
            suffixes.sort();

            assert_eq!(suffixes, vec!["1".to_string(), "1.0.0".to_string()]);
        }

        #[test]
        fn test_glob_files_sorted() {
            let dir = tempfile::tempdir().unwrap();
            File::create(dir.path().join("libcalc1_1.0.0_amd64.deb")).unwrap();
            File::create(dir.path().join("libcalc-dev_1.0.0_amd64.deb")).unwrap();
            File::create(dir.path().join("other_1.0_amd64.deb")).unwrap();
            fs::create_dir(dir.path().join("libcalc-dir.deb")).unwrap();

            let probe = FileSystemCollector::new();
            let names = probe.glob_files(dir.path(), "libcalc", ".deb").unwrap();

            assert_eq!(
                names,
                vec![
                    "libcalc-dev_1.0.0_amd64.deb".to_string(),
                    "libcalc1_1.0.0_amd64.deb".to_string()
                ]
            );
        }
    }
}
