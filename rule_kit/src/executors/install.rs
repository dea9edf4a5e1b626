//! # Installation Rules
//!
//! Checks on what installing the two packages left on the system: package
//! database registration, shared objects and their links, the public
//! header, and (in strict mode) which package owns which file.

use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::{display_paths, DistributionRule, RuleContext, RuleError};
use crate::contracts::is_runtime_package_name;

/// `X.Y.Z` with numeric components
const NUMERIC_TRIPLE: &str = r"^\d+\.\d+\.\d+$";

/// Installed runtime package name, if any
fn installed_runtime_package(ctx: &RuleContext<'_>) -> Result<Option<String>, RuleError> {
    let installed = ctx.packages.list_installed_packages()?;
    Ok(installed
        .into_iter()
        .find(|name| is_runtime_package_name(name, &ctx.distribution.library)))
}

/// Both packages are registered in the package database
pub struct PackageRegistrationRule;

impl DistributionRule for PackageRegistrationRule {
    fn rule_id(&self) -> &'static str {
        "package-registration"
    }

    fn title(&self) -> &'static str {
        "Runtime and development packages are installed"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let identity = &ctx.distribution.library;

        if installed_runtime_package(ctx)?.is_none() {
            return Err(RuleError::Unmet(format!(
                "runtime library package ({} or {}{}) not installed",
                identity.name, identity.name, identity.major_version
            )));
        }

        let dev_package = identity.dev_package();
        if !ctx.packages.list_installed_packages()?.contains(&dev_package) {
            return Err(RuleError::Unmet(format!(
                "development package {} not installed",
                dev_package
            )));
        }

        Ok(())
    }
}

/// The SONAME-versioned shared object is in a library directory
pub struct SharedObjectPlacementRule;

impl DistributionRule for SharedObjectPlacementRule {
    fn rule_id(&self) -> &'static str {
        "shared-object-placement"
    }

    fn title(&self) -> &'static str {
        "Versioned shared object is installed"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let dist = ctx.distribution;
        let identity = &dist.library;
        let soname = identity.soname();
        let major = identity.major_version.to_string();

        for dir in &dist.library_dirs {
            if ctx.filesystem.exists(&dir.join(&soname))? {
                return Ok(());
            }

            for library in ctx.filesystem.glob_versioned_libraries(dir, &identity.name)? {
                let library = library?;
                if library.components().first() == Some(&major.as_str())
                    && ctx.filesystem.exists(&library.path)?
                {
                    return Ok(());
                }
            }
        }

        Err(RuleError::NotFound(format!(
            "{} not found in {}",
            soname,
            display_paths(&dist.library_dirs)
        )))
    }
}

/// Every fully versioned shared object is named `<lib>.so.X.Y.Z`
pub struct SonameFormatRule;

impl DistributionRule for SonameFormatRule {
    fn rule_id(&self) -> &'static str {
        "soname-format"
    }

    fn title(&self) -> &'static str {
        "Shared object carries a numeric X.Y.Z version"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let dist = ctx.distribution;
        let numeric_triple = Regex::new(NUMERIC_TRIPLE)
            .map_err(|e| RuleError::Malformed(format!("invalid version pattern: {}", e)))?;
        let mut malformed = Vec::new();

        for dir in &dist.library_dirs {
            for library in ctx
                .filesystem
                .glob_versioned_libraries(dir, &dist.library.name)?
            {
                let library = library?;
                // Only names matching <lib>.so.*.*.* are real names
                if library.components().len() < 3 {
                    continue;
                }
                if !numeric_triple.is_match(&library.version_suffix) {
                    malformed.push(library.path);
                }
            }
        }

        if malformed.is_empty() {
            Ok(())
        } else {
            Err(RuleError::Malformed(format!(
                "shared object version is not a numeric X.Y.Z triple: {}",
                display_paths(&malformed)
            )))
        }
    }
}

/// The unversioned linker name is installed
pub struct UnversionedLinkRule;

impl UnversionedLinkRule {
    /// Strict form: a symlink resolving to the same file as the SONAME link
    fn check_chain(ctx: &RuleContext<'_>, dir: &Path, link: &Path) -> Result<(), RuleError> {
        let identity = &ctx.distribution.library;

        if !ctx.filesystem.is_symlink(link)? {
            return Err(RuleError::Unmet(format!(
                "{} is a regular file, expected a symlink to {}",
                link.display(),
                identity.soname()
            )));
        }

        let mut soname_link = None;
        let search_dirs = std::iter::once(dir)
            .chain(ctx.distribution.library_dirs.iter().map(PathBuf::as_path));
        for candidate_dir in search_dirs {
            let candidate = candidate_dir.join(identity.soname());
            if ctx.filesystem.exists(&candidate)? {
                soname_link = Some(candidate);
                break;
            }
        }
        let soname_link = soname_link.ok_or_else(|| {
            RuleError::NotFound(format!(
                "{} resolves nowhere: no {} installed",
                link.display(),
                identity.soname()
            ))
        })?;

        let link_target = ctx.filesystem.canonicalize(link)?;
        let soname_target = ctx.filesystem.canonicalize(&soname_link)?;

        if link_target != soname_target {
            return Err(RuleError::Unmet(format!(
                "{} resolves to {}, but {} resolves to {}",
                link.display(),
                link_target.display(),
                soname_link.display(),
                soname_target.display()
            )));
        }

        Ok(())
    }
}

impl DistributionRule for UnversionedLinkRule {
    fn rule_id(&self) -> &'static str {
        "unversioned-link"
    }

    fn title(&self) -> &'static str {
        "Unversioned development link is installed"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let dist = ctx.distribution;
        let linker_name = dist.library.linker_name();
        let mut dangling = None;

        for dir in &dist.library_dirs {
            let link = dir.join(&linker_name);

            if !ctx.filesystem.exists(&link)? {
                if dangling.is_none() && ctx.filesystem.is_symlink(&link)? {
                    dangling = Some(link);
                }
                continue;
            }

            if !ctx.filesystem.is_symlink(&link)? && !ctx.filesystem.is_regular_file(&link)? {
                return Err(RuleError::Unmet(format!(
                    "{} is neither a symlink nor a regular file",
                    link.display()
                )));
            }

            if dist.strict {
                return Self::check_chain(ctx, dir, &link);
            }
            return Ok(());
        }

        match dangling {
            Some(link) => Err(RuleError::Unmet(format!(
                "{} is a dangling symlink",
                link.display()
            ))),
            None => Err(RuleError::NotFound(format!(
                "unversioned {} not found in {}",
                linker_name,
                display_paths(&dist.library_dirs)
            ))),
        }
    }
}

/// The public header is in the include directory
pub struct HeaderInstallationRule;

impl DistributionRule for HeaderInstallationRule {
    fn rule_id(&self) -> &'static str {
        "header-installation"
    }

    fn title(&self) -> &'static str {
        "Public header is installed"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let header = ctx.distribution.header_path();

        if !ctx.filesystem.exists(&header)? {
            return Err(RuleError::NotFound(format!(
                "header file {} not installed",
                header.display()
            )));
        }
        if !ctx.filesystem.is_regular_file(&header)? {
            return Err(RuleError::Unmet(format!(
                "{} is not a regular file",
                header.display()
            )));
        }

        Ok(())
    }
}

/// Each installed file belongs to the right package and to only one
pub struct FileOwnershipRule;

impl FileOwnershipRule {
    fn require_owned(
        package: &str,
        files: &[PathBuf],
        names: &[String],
    ) -> Result<(), RuleError> {
        let missing: Vec<&str> = names
            .iter()
            .filter(|name| {
                !files
                    .iter()
                    .any(|f| f.file_name().and_then(|n| n.to_str()) == Some(name.as_str()))
            })
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RuleError::Unmet(format!(
                "package {} does not own {}",
                package,
                missing.join(", ")
            )))
        }
    }
}

impl DistributionRule for FileOwnershipRule {
    fn rule_id(&self) -> &'static str {
        "file-ownership"
    }

    fn title(&self) -> &'static str {
        "Installed files are partitioned between the two packages"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let identity = &ctx.distribution.library;

        let runtime = installed_runtime_package(ctx)?.ok_or_else(|| {
            RuleError::Unmet(format!("runtime package for {} not installed", identity.name))
        })?;
        let development = identity.dev_package();

        let runtime_files = ctx.packages.list_package_files(&runtime)?;
        let development_files = ctx.packages.list_package_files(&development)?;

        Self::require_owned(
            &runtime,
            &runtime_files,
            &[identity.real_name(), identity.soname()],
        )?;
        Self::require_owned(
            &development,
            &development_files,
            &[identity.linker_name(), identity.header.clone(), identity.pc_file_name()],
        )?;

        let runtime_set: BTreeSet<&PathBuf> = runtime_files.iter().collect();
        let mut shared = Vec::new();
        for path in development_files.iter().filter(|p| runtime_set.contains(p)) {
            // Both packages legitimately list parent directories
            if !ctx.filesystem.is_directory(path)? {
                shared.push(path.clone());
            }
        }

        if shared.is_empty() {
            Ok(())
        } else {
            Err(RuleError::Unmet(format!(
                "files owned by both {} and {}: {}",
                runtime,
                development,
                display_paths(&shared)
            )))
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::executors::testing::{DenyingProbe, FakeOracle, FakePackages, Fixture};
    use crate::executors::{FailureKind, Severity};
    use crate::results::VerificationVerdict;

    fn evaluate_with(
        rule: &dyn DistributionRule,
        fixture: &Fixture,
        packages: &FakePackages,
    ) -> Result<(), RuleError> {
        let oracle = FakeOracle::default();
        rule.evaluate(&fixture.context(packages, &oracle))
    }

    fn evaluate(rule: &dyn DistributionRule, fixture: &Fixture) -> Result<(), RuleError> {
        evaluate_with(rule, fixture, &FakePackages::default())
    }

    /// Real name, SONAME link and linker link in the multiarch directory
    fn install_link_chain(fixture: &Fixture) {
        fixture.write("usr/lib/x86_64-linux-gnu/libcalc.so.1.0.0", "ELF");
        fixture.symlink("libcalc.so.1.0.0", "usr/lib/x86_64-linux-gnu/libcalc.so.1");
        fixture.symlink("libcalc.so.1", "usr/lib/x86_64-linux-gnu/libcalc.so");
    }

    #[test]
    fn test_registration() {
        let fixture = Fixture::new();

        let both = FakePackages::with_installed(&["libc6", "libcalc1t64", "libcalc-dev"]);
        assert!(evaluate_with(&PackageRegistrationRule, &fixture, &both).is_ok());

        let runtime_only = FakePackages::with_installed(&["libcalc1"]);
        let err = evaluate_with(&PackageRegistrationRule, &fixture, &runtime_only).unwrap_err();
        assert_eq!(err.to_string(), "development package libcalc-dev not installed");

        let lookalikes = FakePackages::with_installed(&["libcalculator", "libcalc-devtools"]);
        let err = evaluate_with(&PackageRegistrationRule, &fixture, &lookalikes).unwrap_err();
        assert!(err.to_string().starts_with("runtime library package"));
    }

    #[test]
    fn test_shared_object_placement() {
        let fixture = Fixture::new();
        fixture.write("usr/lib/libcalc.so.1.0.0", "ELF");

        assert!(evaluate(&SharedObjectPlacementRule, &fixture).is_ok());
    }

    #[test]
    fn test_unversioned_name_alone_is_not_placement() {
        let fixture = Fixture::new();
        fixture.write("usr/lib/libcalc.so", "ELF");

        let err = evaluate(&SharedObjectPlacementRule, &fixture).unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::NotFound);
        assert!(err.to_string().starts_with("libcalc.so.1 not found in"));
    }

    #[test]
    fn test_other_major_is_not_placement() {
        let fixture = Fixture::new();
        fixture.write("usr/lib/libcalc.so.2.0.0", "ELF");

        assert!(evaluate(&SharedObjectPlacementRule, &fixture).is_err());
    }

    #[test]
    fn test_soname_format() {
        let fixture = Fixture::new();
        fixture.write("usr/lib/libcalc.so.1.0.0", "ELF");
        fixture.write("usr/lib/libcalc.so", "ELF");
        assert!(evaluate(&SonameFormatRule, &fixture).is_ok());

        fixture.write("usr/lib/x86_64-linux-gnu/libcalc.so.1.0.beta", "ELF");
        let err = evaluate(&SonameFormatRule, &fixture).unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::MalformedArtifact);
        assert!(err.to_string().contains("libcalc.so.1.0.beta"));
    }

    #[test]
    fn test_soname_format_vacuous() {
        let fixture = Fixture::new();
        fixture.write("usr/lib/libcalc.so.1", "ELF");

        assert!(evaluate(&SonameFormatRule, &fixture).is_ok());
    }

    #[test]
    fn test_unversioned_link_relaxed() {
        let fixture = Fixture::new();
        assert!(evaluate(&UnversionedLinkRule, &fixture).is_err());

        // A plain copy is accepted outside strict mode
        fixture.write("usr/lib/libcalc.so", "ELF");
        assert!(evaluate(&UnversionedLinkRule, &fixture).is_ok());
    }

    #[test]
    fn test_unversioned_link_dangling() {
        let fixture = Fixture::new();
        fixture.symlink("libcalc.so.1", "usr/lib/libcalc.so");

        let err = evaluate(&UnversionedLinkRule, &fixture).unwrap_err();
        assert!(err.to_string().ends_with("is a dangling symlink"));
    }

    #[test]
    fn test_unversioned_link_strict() {
        let mut fixture = Fixture::new();
        fixture.distribution.strict = true;

        install_link_chain(&fixture);
        assert!(evaluate(&UnversionedLinkRule, &fixture).is_ok());
    }

    #[test]
    fn test_unversioned_link_strict_rejects_copy() {
        let mut fixture = Fixture::new();
        fixture.distribution.strict = true;
        fixture.write("usr/lib/x86_64-linux-gnu/libcalc.so.1.0.0", "ELF");
        fixture.symlink("libcalc.so.1.0.0", "usr/lib/x86_64-linux-gnu/libcalc.so.1");
        fixture.write("usr/lib/x86_64-linux-gnu/libcalc.so", "ELF");

        let err = evaluate(&UnversionedLinkRule, &fixture).unwrap_err();
        assert!(err.to_string().contains("expected a symlink to libcalc.so.1"));
    }

    #[test]
    fn test_unversioned_link_strict_wrong_target() {
        let mut fixture = Fixture::new();
        fixture.distribution.strict = true;
        fixture.write("usr/lib/x86_64-linux-gnu/libcalc.so.1.0.0", "ELF");
        fixture.write("usr/lib/x86_64-linux-gnu/libcalc.so.0.9.0", "old ELF");
        fixture.symlink("libcalc.so.1.0.0", "usr/lib/x86_64-linux-gnu/libcalc.so.1");
        fixture.symlink("libcalc.so.0.9.0", "usr/lib/x86_64-linux-gnu/libcalc.so");

        let err = evaluate(&UnversionedLinkRule, &fixture).unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::Unmet);
        assert!(err.to_string().contains("resolves to"));
    }

    #[test]
    fn test_header() {
        let fixture = Fixture::new();
        assert!(evaluate(&HeaderInstallationRule, &fixture).is_err());

        fixture.write("usr/include/calc.h", "int add(int a, int b);\n");
        assert!(evaluate(&HeaderInstallationRule, &fixture).is_ok());
    }

    #[test]
    fn test_unreadable_header_is_a_probe_error() {
        let fixture = Fixture::new();
        let header = fixture.write("usr/include/calc.h", "int add(int a, int b);\n");
        let probe = DenyingProbe::new(header);
        let packages = FakePackages::default();
        let oracle = FakeOracle::default();

        let outcome =
            HeaderInstallationRule.evaluate(&fixture.context_with_probe(&probe, &packages, &oracle));
        let err = outcome.as_ref().unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::ProbeError);
        assert_eq!(err.severity(), Severity::Error);

        let verdict = VerificationVerdict::from_outcome(&HeaderInstallationRule, &outcome);
        assert!(!verdict.passed);
        assert_eq!(verdict.severity, Severity::Error);
        assert_eq!(verdict.failure_kind, Some(FailureKind::ProbeError));
    }

    #[test]
    fn test_strict_chain_reports_unreadable_soname_link() {
        let mut fixture = Fixture::new();
        fixture.distribution.strict = true;
        install_link_chain(&fixture);
        let probe = DenyingProbe::new(fixture.path("usr/lib/x86_64-linux-gnu/libcalc.so.1"));
        let packages = FakePackages::default();
        let oracle = FakeOracle::default();

        let err = UnversionedLinkRule
            .evaluate(&fixture.context_with_probe(&probe, &packages, &oracle))
            .unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::ProbeError);
        assert!(!err.to_string().contains("resolves nowhere"));
    }

    fn owned_files(fixture: &Fixture) -> FakePackages {
        let mut packages = FakePackages::with_installed(&["libcalc1", "libcalc-dev"]);
        let lib = fixture.path("usr/lib/x86_64-linux-gnu");
        packages.files.insert(
            "libcalc1".to_string(),
            vec![lib.clone(), lib.join("libcalc.so.1.0.0"), lib.join("libcalc.so.1")],
        );
        packages.files.insert(
            "libcalc-dev".to_string(),
            vec![
                lib.clone(),
                lib.join("libcalc.so"),
                fixture.path("usr/include/calc.h"),
                lib.join("pkgconfig/libcalc.pc"),
            ],
        );
        packages
    }

    #[test]
    fn test_file_ownership() {
        let fixture = Fixture::new();
        let packages = owned_files(&fixture);

        assert!(evaluate_with(&FileOwnershipRule, &fixture, &packages).is_ok());
    }

    #[test]
    fn test_file_ownership_overlap() {
        let fixture = Fixture::new();
        let mut packages = owned_files(&fixture);
        let shared = fixture.path("usr/lib/x86_64-linux-gnu/libcalc.so.1");
        packages
            .files
            .get_mut("libcalc-dev")
            .unwrap()
            .push(shared);

        let err = evaluate_with(&FileOwnershipRule, &fixture, &packages).unwrap_err();
        assert!(err.to_string().starts_with("files owned by both libcalc1 and libcalc-dev"));
    }

    #[test]
    fn test_file_ownership_misplaced_link() {
        let fixture = Fixture::new();
        let mut packages = owned_files(&fixture);
        let link = fixture.path("usr/lib/x86_64-linux-gnu/libcalc.so");
        packages.files.get_mut("libcalc-dev").unwrap().retain(|p| *p != link);
        packages.files.get_mut("libcalc1").unwrap().push(link);

        let err = evaluate_with(&FileOwnershipRule, &fixture, &packages).unwrap_err();
        assert_eq!(err.to_string(), "package libcalc-dev does not own libcalc.so");
    }
}
