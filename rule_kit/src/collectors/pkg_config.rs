//! pkg-config descriptor (`.pc`) resolution without the external tool
//!
//! Lines are either variable definitions (`prefix=/usr`) or keyword fields
//! (`Cflags: -I${includedir}`). Whichever of `=` or `:` appears first
//! decides the kind. `${name}` references are expanded recursively and
//! `$$` is a literal dollar sign.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::filesystem::{FilesystemProbe, ProbeError};

/// Bound on nested `${var}` expansion
const MAX_EXPANSION_DEPTH: usize = 16;

/// Errors parsing or expanding a `.pc` file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("line {line}: expected 'name=value' or 'Field: value'")]
    UnrecognisedLine { line: usize },

    #[error("line {line}: empty name")]
    EmptyName { line: usize },

    #[error("unterminated variable reference in '{value}'")]
    UnterminatedReference { value: String },

    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String },

    #[error("variable expansion deeper than {} levels", MAX_EXPANSION_DEPTH)]
    ExpansionTooDeep,
}

/// Parsed `.pc` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PcDescriptor {
    variables: HashMap<String, String>,
    fields: HashMap<String, String>,
}

impl PcDescriptor {
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        let mut descriptor = PcDescriptor::default();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let eq = line.find('=');
            let colon = line.find(':');
            let (split_at, is_variable) = match (eq, colon) {
                (Some(e), Some(c)) if e < c => (e, true),
                (Some(e), None) => (e, true),
                (_, Some(c)) => (c, false),
                (None, None) => return Err(DescriptorError::UnrecognisedLine { line: index + 1 }),
            };

            let key = line[..split_at].trim().to_string();
            let value = line[split_at + 1..].trim().to_string();

            if key.is_empty() {
                return Err(DescriptorError::EmptyName { line: index + 1 });
            }

            if is_variable {
                descriptor.variables.insert(key, value);
            } else {
                descriptor.fields.insert(key.to_ascii_lowercase(), value);
            }
        }

        Ok(descriptor)
    }

    /// Keyword field with variables expanded; keywords are case-insensitive
    pub fn field(&self, name: &str) -> Result<Option<String>, DescriptorError> {
        match self.fields.get(&name.to_ascii_lowercase()) {
            Some(raw) => self.expand(raw, 0).map(Some),
            None => Ok(None),
        }
    }

    fn expand(&self, value: &str, depth: usize) -> Result<String, DescriptorError> {
        if depth > MAX_EXPANSION_DEPTH {
            return Err(DescriptorError::ExpansionTooDeep);
        }

        let mut out = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                out.push('$');
                rest = tail;
            } else if let Some(tail) = after.strip_prefix('{') {
                let end = tail
                    .find('}')
                    .ok_or_else(|| DescriptorError::UnterminatedReference {
                        value: value.to_string(),
                    })?;
                let name = &tail[..end];
                let raw = self
                    .variables
                    .get(name)
                    .ok_or_else(|| DescriptorError::UndefinedVariable {
                        name: name.to_string(),
                    })?;
                out.push_str(&self.expand(raw, depth + 1)?);
                rest = &tail[end + 1..];
            } else {
                out.push('$');
                rest = after;
            }
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// First `<name>.pc` on the search path
pub fn find_descriptor(
    probe: &dyn FilesystemProbe,
    search_path: &[PathBuf],
    name: &str,
) -> Result<Option<PathBuf>, ProbeError> {
    let file_name = format!("{}.pc", name);

    for dir in search_path {
        let candidate = Path::new(dir).join(&file_name);
        if probe.is_regular_file(&candidate)? {
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::FileSystemCollector;

    const LIBCALC_PC: &str = "\
prefix=/usr
exec_prefix=${prefix}
libdir=${exec_prefix}/lib
includedir=${prefix}/include

Name: libcalc
Description: Simple arithmetic library
Version: 1.0.0
Libs: -L${libdir} -lcalc
Cflags: -I${includedir}
";

    #[test]
    fn test_expands_nested_variables() {
        let pc = PcDescriptor::parse(LIBCALC_PC).unwrap();

        assert_eq!(pc.field("Cflags").unwrap().as_deref(), Some("-I/usr/include"));
        assert_eq!(pc.field("libs").unwrap().as_deref(), Some("-L/usr/lib -lcalc"));
        assert_eq!(pc.field("Requires").unwrap(), None);
    }

    #[test]
    fn test_literal_fields() {
        let pc = PcDescriptor::parse("Name: libcalc\nCflags: -I/usr/include\nLibs: -lcalc\n").unwrap();

        assert_eq!(pc.field("Cflags").unwrap().as_deref(), Some("-I/usr/include"));
        assert_eq!(pc.field("Libs").unwrap().as_deref(), Some("-lcalc"));
    }

    #[test]
    fn test_undefined_and_cyclic_variables() {
        let undefined = PcDescriptor::parse("Cflags: -I${includedir}\n").unwrap();
        assert_eq!(
            undefined.field("Cflags"),
            Err(DescriptorError::UndefinedVariable {
                name: "includedir".to_string()
            })
        );

        let cyclic = PcDescriptor::parse("a=${b}\nb=${a}\nCflags: ${a}\n").unwrap();
        assert_eq!(cyclic.field("Cflags"), Err(DescriptorError::ExpansionTooDeep));

        let open = PcDescriptor::parse("Cflags: -I${includedir\n").unwrap();
        assert!(matches!(
            open.field("Cflags"),
            Err(DescriptorError::UnterminatedReference { .. })
        ));
    }

    #[test]
    fn test_unrecognised_lines() {
        assert_eq!(
            PcDescriptor::parse("Name: libcalc\njust words\n"),
            Err(DescriptorError::UnrecognisedLine { line: 2 })
        );
        assert_eq!(
            PcDescriptor::parse("=/usr\n"),
            Err(DescriptorError::EmptyName { line: 1 })
        );
    }

    #[test]
    fn test_dollar_escape() {
        let pc = PcDescriptor::parse("Description: costs $$5\n").unwrap();
        assert_eq!(pc.field("Description").unwrap().as_deref(), Some("costs $5"));
    }

    #[test]
    fn test_find_descriptor_in_search_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("libcalc.pc"), LIBCALC_PC).unwrap();

        let probe = FileSystemCollector::new();
        let search = vec![first.path().to_path_buf(), second.path().to_path_buf()];

        assert_eq!(
            find_descriptor(&probe, &search, "libcalc").unwrap(),
            Some(second.path().join("libcalc.pc"))
        );
        assert_eq!(find_descriptor(&probe, &search, "libother").unwrap(), None);
    }
}
