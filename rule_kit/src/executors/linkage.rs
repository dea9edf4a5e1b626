//! # Linkage Rules
//!
//! Checks from the downstream consumer's point of view: pkg-config hands
//! out usable flags, the consumer binary runs, the dynamic linker resolves
//! its SONAME, and the captured output carries the expected results.

use regex::Regex;

use super::{DistributionRule, RuleContext, RuleError};
use crate::collectors::{PkgConfigMode, QueryError};
use crate::contracts::ExpectedResult;

/// pkg-config finds the library and reports include and link flags
pub struct PkgConfigResolutionRule;

impl DistributionRule for PkgConfigResolutionRule {
    fn rule_id(&self) -> &'static str {
        "pkg-config-resolution"
    }

    fn title(&self) -> &'static str {
        "pkg-config resolves compiler and linker flags"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let dist = ctx.distribution;
        let name = dist.pkg_config.name.as_str();

        match ctx.packages.query_pkg_config(name, PkgConfigMode::Exists) {
            Ok(_) => {}
            Err(QueryError::DescriptorNotFound { .. }) => {
                return Err(RuleError::NotFound(format!(
                    "pkg-config cannot find {}.pc",
                    name
                )))
            }
            Err(e) => return Err(e.into()),
        }

        let cflags = ctx.packages.query_pkg_config(name, PkgConfigMode::CFlags)?;
        if !cflags.contains("-I") {
            return Err(RuleError::Unmet(format!(
                "pkg-config --cflags did not return an include path (got '{}')",
                cflags
            )));
        }

        let libs = ctx.packages.query_pkg_config(name, PkgConfigMode::Libs)?;
        let link_flag = format!("-l{}", dist.library.short_name());
        if !libs.split_whitespace().any(|flag| flag == link_flag) {
            return Err(RuleError::Unmet(format!(
                "pkg-config --libs did not return {} (got '{}')",
                link_flag, libs
            )));
        }

        Ok(())
    }
}

/// Consumer binary path as a program argument
fn consumer_program(ctx: &RuleContext<'_>) -> Result<String, RuleError> {
    let binary = &ctx.distribution.consumer.binary;

    if !ctx.filesystem.exists(binary)? {
        return Err(RuleError::NotFound(format!(
            "consumer binary not found at {}",
            binary.display()
        )));
    }

    binary
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| RuleError::Malformed(format!("{} is not a UTF-8 path", binary.display())))
}

/// The consumer runs to a zero exit from its own directory
pub struct ConsumerExecutionRule;

impl DistributionRule for ConsumerExecutionRule {
    fn rule_id(&self) -> &'static str {
        "consumer-execution"
    }

    fn title(&self) -> &'static str {
        "Consumer binary runs successfully"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let consumer = &ctx.distribution.consumer;
        let program = consumer_program(ctx)?;

        if !ctx.filesystem.is_executable(&consumer.binary)? {
            return Err(RuleError::Unmet(format!(
                "consumer binary {} is not executable",
                program
            )));
        }

        let output = ctx.oracle.run(&program, &[], consumer.working_dir())?;
        if !output.success() {
            return Err(RuleError::Unmet(format!(
                "consumer failed with exit code {}{}",
                output.exit_code,
                stderr_suffix(&output.stderr)
            )));
        }

        Ok(())
    }
}

fn stderr_suffix(stderr: &str) -> String {
    match stderr.trim().lines().next() {
        Some(line) if !line.is_empty() => format!(": {}", line),
        _ => String::new(),
    }
}

/// The dynamic linker resolves the consumer's dependency on the SONAME
pub struct ConsumerLinkageRule;

impl DistributionRule for ConsumerLinkageRule {
    fn rule_id(&self) -> &'static str {
        "consumer-linkage"
    }

    fn title(&self) -> &'static str {
        "Consumer links against the installed SONAME"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let program = consumer_program(ctx)?;
        let soname = ctx.distribution.library.soname();

        let output = ctx.oracle.run("ldd", &[program.as_str()], None)?;
        if !output.success() {
            return Err(RuleError::Unmet(format!(
                "ldd failed on {} with exit code {}{}",
                program,
                output.exit_code,
                stderr_suffix(&output.stderr)
            )));
        }

        // "\tlibcalc.so.1 => /usr/lib/x86_64-linux-gnu/libcalc.so.1 (0x...)"
        let Some(line) = output
            .stdout
            .lines()
            .find(|line| line.split_whitespace().next() == Some(soname.as_str()))
        else {
            return Err(RuleError::Unmet(format!(
                "consumer not linked against {}",
                soname
            )));
        };

        if line.contains("not found") {
            return Err(RuleError::Unmet(format!(
                "dynamic linker cannot resolve {}: {}",
                soname,
                line.trim()
            )));
        }

        Ok(())
    }
}

/// The consumer's captured output carries an additive and a multiplicative result
pub struct VerificationOutputRule;

impl VerificationOutputRule {
    /// Full expression, or the bare value as a standalone token
    fn found(content: &str, expected: &ExpectedResult) -> Result<bool, RuleError> {
        if content.contains(&expected.expression) {
            return Ok(true);
        }

        let pattern = format!(r"(?:^|[^\w.]){}(?:[^\w.]|$)", regex::escape(&expected.value));
        let token = Regex::new(&pattern).map_err(|e| {
            RuleError::Malformed(format!("invalid expected value '{}': {}", expected.value, e))
        })?;

        Ok(content.lines().any(|line| token.is_match(line)))
    }
}

impl DistributionRule for VerificationOutputRule {
    fn rule_id(&self) -> &'static str {
        "verification-output"
    }

    fn title(&self) -> &'static str {
        "Consumer output contains the expected results"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let consumer = &ctx.distribution.consumer;

        let content = match ctx.filesystem.read_to_string(&consumer.output_file) {
            Ok(content) => content,
            Err(e) if e.is_not_found() => {
                return Err(RuleError::NotFound(format!(
                    "{} does not exist",
                    consumer.output_file.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let families: [(&str, fn(&ExpectedResult) -> bool); 2] = [
            ("additive", |r: &ExpectedResult| r.kind.is_additive()),
            ("multiplicative", |r: &ExpectedResult| r.kind.is_multiplicative()),
        ];

        for (family, belongs) in families {
            let candidates: Vec<&ExpectedResult> =
                consumer.expected_results.iter().filter(|r| belongs(r)).collect();

            let mut satisfied = false;
            for expected in &candidates {
                if Self::found(&content, expected)? {
                    satisfied = true;
                    break;
                }
            }

            if !satisfied {
                let wanted = candidates
                    .iter()
                    .map(|r| format!("'{}'", r.expression))
                    .collect::<Vec<_>>()
                    .join(" or ");
                return Err(RuleError::Unmet(format!(
                    "output missing {} result (expected {})",
                    family, wanted
                )));
            }
        }

        Ok(())
    }
}
