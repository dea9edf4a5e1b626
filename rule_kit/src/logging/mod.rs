//! Global logging for distribution verification
//!
//! Thin layer over the `log` facade. Adds stable message codes, key/value
//! context rendering and per-run error/warning counters used for the
//! cargo-style summary printed at the end of a run.
//!
//! The macros (`log_info!`, `log_debug!`, `log_warning!`, `log_error!`,
//! `log_success!`) are exported at the crate root.

pub mod codes;
mod macros;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

pub use codes::Code;

/// Environment variable holding the `env_logger` filter
pub const LOG_ENV_VAR: &str = "LIBDIST_LOG";

static INITIALIZED: OnceLock<()> = OnceLock::new();
static ERROR_COUNT: AtomicUsize = AtomicUsize::new(0);
static WARNING_COUNT: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging with the default `warn` filter
pub fn init_global_logging() -> Result<(), String> {
    init_with_default_filter("warn")
}

/// Initialize global logging; `LIBDIST_LOG` overrides `default_filter`
pub fn init_with_default_filter(default_filter: &str) -> Result<(), String> {
    if INITIALIZED.get().is_some() {
        return Err("Global logger already initialized".to_string());
    }

    let env = env_logger::Env::new().filter_or(LOG_ENV_VAR, default_filter);
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))?;

    let _ = INITIALIZED.set(());
    Ok(())
}

// ============================================================================
// EMITTERS (called by the macros)
// ============================================================================

/// Render `message key=value key=value`
pub fn render_context(message: &str, context: &[(&str, String)]) -> String {
    if context.is_empty() {
        return message.to_string();
    }

    let pairs: Vec<String> = context
        .iter()
        .map(|(key, value)| {
            if value.contains(char::is_whitespace) {
                format!("{}={:?}", key, value)
            } else {
                format!("{}={}", key, value)
            }
        })
        .collect();

    format!("{} {}", message, pairs.join(" "))
}

pub fn log_error_with_context(code: Code, message: &str, context: &[(&str, String)]) {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
    log::error!("[{}] {}", code.code, render_context(message, context));
}

pub fn log_warning_with_context(message: &str, context: &[(&str, String)]) {
    WARNING_COUNT.fetch_add(1, Ordering::Relaxed);
    log::warn!("{}", render_context(message, context));
}

pub fn log_success_with_context(code: Code, message: &str, context: &[(&str, String)]) {
    log::info!("[{}] {}", code.code, render_context(message, context));
}

pub fn log_info_with_context(message: &str, context: &[(&str, String)]) {
    log::info!("{}", render_context(message, context));
}

pub fn log_debug_with_context(message: &str, context: &[(&str, String)]) {
    log::debug!("{}", render_context(message, context));
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Error and warning counts emitted so far in this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoggingSummary {
    pub errors: usize,
    pub warnings: usize,
}

pub fn summary() -> LoggingSummary {
    LoggingSummary {
        errors: ERROR_COUNT.load(Ordering::Relaxed),
        warnings: WARNING_COUNT.load(Ordering::Relaxed),
    }
}

/// Print `warning: ... generated N warnings` style lines to stderr
pub fn print_cargo_style_summary() {
    let summary = summary();

    if summary.warnings > 0 {
        eprintln!(
            "warning: libdist-verify generated {} warning{}",
            summary.warnings,
            if summary.warnings == 1 { "" } else { "s" }
        );
    }
    if summary.errors > 0 {
        eprintln!(
            "error: libdist-verify logged {} error{}",
            summary.errors,
            if summary.errors == 1 { "" } else { "s" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_context_plain() {
        assert_eq!(render_context("Rule passed", &[]), "Rule passed");
    }

    #[test]
    fn test_render_context_quotes_whitespace() {
        let rendered = render_context(
            "Rule failed",
            &[
                ("rule", "soname-format".to_string()),
                ("reason", "bad name".to_string()),
            ],
        );
        assert_eq!(rendered, "Rule failed rule=soname-format reason=\"bad name\"");
    }

    #[test]
    fn test_error_macro_counts() {
        let before = summary().errors;
        crate::log_error!(codes::system::INTERNAL_ERROR, "boom", "detail" => 42);
        assert!(summary().errors > before);
    }
}
