//! Verification Registry Setup
//!
//! Creates the collectors, the command executor and the rule registry for
//! one distribution.

use std::sync::Arc;
use std::time::Duration;

use rule_kit::collectors::{DpkgCollector, FileSystemCollector, SystemCommandExecutor};
use rule_kit::commands::{configure_pkg_config_env, create_debian_command_executor};
use rule_kit::contracts::LibraryDistribution;
use rule_kit::execution_api::{RuleContext, RuleRegistry};
use rule_kit::log_warning;

/// Everything a verification run observes the system through
pub struct VerificationServices {
    pub filesystem: Arc<FileSystemCollector>,
    pub executor: Arc<SystemCommandExecutor>,
    pub packages: DpkgCollector,
    pub registry: RuleRegistry,
}

impl VerificationServices {
    pub fn context<'a>(&'a self, distribution: &'a LibraryDistribution) -> RuleContext<'a> {
        RuleContext {
            distribution,
            filesystem: self.filesystem.as_ref(),
            packages: &self.packages,
            oracle: self.executor.as_ref(),
        }
    }
}

/// Whitelisted executor for the Debian query tools plus the consumer binary
pub fn create_command_executor(distribution: &LibraryDistribution) -> SystemCommandExecutor {
    let timeout = Duration::from_secs(distribution.consumer.timeout_secs);
    let mut executor = create_debian_command_executor(timeout);

    match distribution.consumer.binary.to_str() {
        Some(program) => executor.allow_command(program),
        None => log_warning!(
            "Consumer path is not UTF-8 and cannot be run",
            "path" => distribution.consumer.binary.display()
        ),
    }
    configure_pkg_config_env(&mut executor, &distribution.pkg_config);

    executor
}

/// Create the services and the standard rule set for `distribution`
pub fn create_services(distribution: &LibraryDistribution) -> VerificationServices {
    let filesystem = Arc::new(FileSystemCollector::new());
    let executor = Arc::new(create_command_executor(distribution));
    let packages = DpkgCollector::new(
        executor.clone(),
        filesystem.clone(),
        distribution.pkg_config.clone(),
    );

    VerificationServices {
        filesystem,
        executor,
        packages,
        registry: RuleRegistry::standard(distribution.strict),
    }
}
