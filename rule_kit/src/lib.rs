//! # Rule Kit
//!
//! Packaging-contract verification for native shared-library distributions.
//! Provides probes, the distribution model, the rule engine and the report
//! aggregator.
//!
//! ## Modules
//!
//! - `collectors` - Read-only probes of the installed system (files, packages, commands)
//! - `executors` - One rule per packaging-contract condition
//! - `contracts` - Library distribution model and Debian metadata parsing
//! - `commands` - Debian command whitelists
//! - `results` - Verdicts, reports and summaries
//! - `execution_api` - Rule registry and verification entry point
//! - `logging` - Structured logging macros and message codes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rule_kit::collectors::{DpkgCollector, FileSystemCollector};
//! use rule_kit::commands::create_debian_command_executor;
//! use rule_kit::execution_api::{RuleContext, RuleRegistry};
//!
//! let executor = Arc::new(create_debian_command_executor(DEFAULT_TIMEOUT));
//! let filesystem = Arc::new(FileSystemCollector::new());
//! let packages = DpkgCollector::new(executor.clone(), filesystem.clone(), distribution.pkg_config.clone());
//!
//! let report = RuleRegistry::standard(false).verify(&RuleContext {
//!     distribution: &distribution,
//!     filesystem: filesystem.as_ref(),
//!     packages: &packages,
//!     oracle: executor.as_ref(),
//! });
//! ```

pub mod collectors;
pub mod commands;
pub mod contracts;
pub mod execution_api;
pub mod executors;
pub mod logging;
pub mod results;
