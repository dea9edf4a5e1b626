//! # Packaging Manifest
//!
//! Parser for `debian/control`: stanzas of `Field: value` lines separated
//! by blank lines. Continuation lines start with whitespace and extend the
//! previous field; `#` lines are comments.

use super::artifacts::{classify_package_name, PackageRole};
use super::distribution::LibraryIdentity;
use super::DistributionError;

/// One paragraph of the control file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestStanza {
    fields: Vec<(String, String)>,
}

impl ManifestStanza {
    /// Field value, matched case-insensitively as deb822 requires
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Parsed `debian/control`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagingManifest {
    stanzas: Vec<ManifestStanza>,
}

impl PackagingManifest {
    pub fn parse(text: &str) -> Result<Self, DistributionError> {
        let mut stanzas = Vec::new();
        let mut current = ManifestStanza::default();

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;

            if line.starts_with('#') {
                continue;
            }

            if line.trim().is_empty() {
                if !current.fields.is_empty() {
                    stanzas.push(std::mem::take(&mut current));
                }
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                let Some((_, value)) = current.fields.last_mut() else {
                    return Err(DistributionError::MalformedManifest {
                        line: line_number,
                        reason: "continuation line before any field".to_string(),
                    });
                };
                value.push('\n');
                value.push_str(line.trim());
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                return Err(DistributionError::MalformedManifest {
                    line: line_number,
                    reason: format!("expected 'Field: value', got '{}'", line.trim()),
                });
            };

            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(DistributionError::MalformedManifest {
                    line: line_number,
                    reason: format!("invalid field name '{}'", key),
                });
            }

            current
                .fields
                .push((key.to_string(), value.trim().to_string()));
        }

        if !current.fields.is_empty() {
            stanzas.push(current);
        }

        Ok(Self { stanzas })
    }

    pub fn stanzas(&self) -> &[ManifestStanza] {
        &self.stanzas
    }

    /// `Source:` value from the first stanza declaring one
    pub fn source(&self) -> Option<&str> {
        self.stanzas
            .iter()
            .find_map(|s| s.get("Source"))
            .filter(|v| !v.is_empty())
    }

    /// Every `Package:` value, in declaration order
    pub fn package_names(&self) -> Vec<&str> {
        self.stanzas.iter().filter_map(|s| s.get("Package")).collect()
    }

    /// Declared packages playing `role` for the given library
    pub fn packages_with_role(&self, identity: &LibraryIdentity, role: PackageRole) -> Vec<&str> {
        self.package_names()
            .into_iter()
            .filter(|name| classify_package_name(name, identity) == Some(role))
            .collect()
    }
}
