//! # Packaging Rules
//!
//! Checks on the library source tree's `debian/` directory and on the
//! `.deb` files the package build produced.

use super::{DistributionRule, RuleContext, RuleError};
use crate::contracts::{PackageArtifact, PackageRole, PackagingManifest};

/// `debian/control` is present and declares both packages
pub struct ManifestPresenceRule;

impl DistributionRule for ManifestPresenceRule {
    fn rule_id(&self) -> &'static str {
        "manifest-presence"
    }

    fn title(&self) -> &'static str {
        "Packaging manifest declares runtime and development packages"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let dist = ctx.distribution;
        let manifest_dir = dist.manifest_dir();

        if !ctx.filesystem.exists(&manifest_dir)? {
            return Err(RuleError::NotFound(format!(
                "{} directory does not exist",
                manifest_dir.display()
            )));
        }
        if !ctx.filesystem.is_directory(&manifest_dir)? {
            return Err(RuleError::Unmet(format!(
                "{} is not a directory",
                manifest_dir.display()
            )));
        }

        let control_path = dist.control_path();
        let text = match ctx.filesystem.read_to_string(&control_path) {
            Ok(text) => text,
            Err(e) if e.is_not_found() => {
                return Err(RuleError::NotFound("debian/control file does not exist".to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let manifest =
            PackagingManifest::parse(&text).map_err(|e| RuleError::Malformed(e.to_string()))?;

        if manifest.source().is_none() {
            return Err(RuleError::Unmet("control file missing Source field".to_string()));
        }

        let identity = &dist.library;
        if manifest
            .packages_with_role(identity, PackageRole::Runtime)
            .is_empty()
        {
            return Err(RuleError::Unmet(format!(
                "control file missing runtime package ({} or {}{})",
                identity.name, identity.name, identity.major_version
            )));
        }

        let dev_package = identity.dev_package();
        match manifest
            .packages_with_role(identity, PackageRole::Development)
            .len()
        {
            1 => Ok(()),
            0 => Err(RuleError::Unmet(format!(
                "control file missing dev package ({})",
                dev_package
            ))),
            n => Err(RuleError::Unmet(format!(
                "control file declares {} stanzas for {}, expected exactly one",
                n, dev_package
            ))),
        }
    }
}

/// `debian/rules` exists and is executable
pub struct BuildScriptRule;

impl DistributionRule for BuildScriptRule {
    fn rule_id(&self) -> &'static str {
        "build-script"
    }

    fn title(&self) -> &'static str {
        "Build script is present and executable"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let rules_path = ctx.distribution.rules_path();

        if !ctx.filesystem.exists(&rules_path)? {
            return Err(RuleError::NotFound("debian/rules file does not exist".to_string()));
        }
        if !ctx.filesystem.is_executable(&rules_path)? {
            return Err(RuleError::Unmet("debian/rules is not executable".to_string()));
        }

        Ok(())
    }
}

/// `debian/changelog` exists
pub struct ChangelogPresenceRule;

impl DistributionRule for ChangelogPresenceRule {
    fn rule_id(&self) -> &'static str {
        "changelog-presence"
    }

    fn title(&self) -> &'static str {
        "Change history is present"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        if ctx.filesystem.exists(&ctx.distribution.changelog_path())? {
            Ok(())
        } else {
            Err(RuleError::NotFound("debian/changelog file does not exist".to_string()))
        }
    }
}

/// Exactly one runtime and one development `.deb`
pub struct ArtifactPartitionRule;

impl DistributionRule for ArtifactPartitionRule {
    fn rule_id(&self) -> &'static str {
        "artifact-partition"
    }

    fn title(&self) -> &'static str {
        "Build produced separate runtime and development packages"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let dist = ctx.distribution;
        let identity = &dist.library;

        let files = ctx
            .filesystem
            .glob_files(&dist.artifact_dir, &identity.name, ".deb")?;

        if files.len() < 2 {
            return Err(RuleError::Unmet(format!(
                "less than 2 packages: found {} {}*.deb in {}",
                files.len(),
                identity.name,
                dist.artifact_dir.display()
            )));
        }

        let artifacts: Vec<PackageArtifact> = files
            .iter()
            .filter_map(|f| PackageArtifact::from_file_name(f, identity))
            .collect();

        let (runtime, development): (Vec<&PackageArtifact>, Vec<&PackageArtifact>) = artifacts
            .iter()
            .filter(|a| a.role.is_some())
            .partition(|a| a.role == Some(PackageRole::Runtime));

        for (role, found) in [
            (PackageRole::Runtime, &runtime),
            (PackageRole::Development, &development),
        ] {
            match found.len() {
                1 => {}
                0 => {
                    return Err(RuleError::NotFound(format!(
                        "no {} .deb package found in {}",
                        role,
                        dist.artifact_dir.display()
                    )))
                }
                n => {
                    let names: Vec<&str> = found.iter().map(|a| a.file_name.as_str()).collect();
                    return Err(RuleError::Unmet(format!(
                        "expected exactly one {} .deb package, found {}: {}",
                        role,
                        n,
                        names.join(", ")
                    )));
                }
            }
        }

        if dist.strict {
            check_matching_versions(runtime[0], development[0])?;
        }

        Ok(())
    }
}

/// Both packages come from one source build, so they share a version
fn check_matching_versions(
    runtime: &PackageArtifact,
    development: &PackageArtifact,
) -> Result<(), RuleError> {
    let mut versions = Vec::with_capacity(2);
    for artifact in [runtime, development] {
        match artifact.version.as_deref() {
            Some(version) => versions.push(version),
            None => {
                return Err(RuleError::Malformed(format!(
                    "{} has no version in its file name",
                    artifact.file_name
                )))
            }
        }
    }

    if versions[0] != versions[1] {
        return Err(RuleError::Unmet(format!(
            "{} is version {} but {} is version {}",
            runtime.file_name, versions[0], development.file_name, versions[1]
        )));
    }
    Ok(())
}
