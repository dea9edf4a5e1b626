//! Debian command executor configuration
//!
//! Provides a whitelisted command executor for package-database, pkg-config
//! and dynamic-link queries on Debian-family systems.

use crate::collectors::SystemCommandExecutor;
use crate::contracts::PkgConfigSettings;
use std::time::Duration;

/// Programs every Debian verification run may invoke
pub const DEBIAN_QUERY_COMMANDS: &[&str] = &[
    "dpkg-query",           // Standard PATH lookup
    "/usr/bin/dpkg-query",  // Absolute location
    "pkg-config",           // Standard PATH lookup
    "/usr/bin/pkg-config",  // Absolute location
    "pkgconf",              // Drop-in replacement on newer releases
    "ldd",                  // Standard PATH lookup
    "/usr/bin/ldd",         // Absolute location
];

/// Create command executor configured for Debian distribution checks
///
/// The consumer binary is not whitelisted here; callers add its configured
/// path with [`SystemCommandExecutor::allow_command`].
pub fn create_debian_command_executor(timeout: Duration) -> SystemCommandExecutor {
    let mut executor = SystemCommandExecutor::with_timeout(timeout);
    executor.allow_commands(DEBIAN_QUERY_COMMANDS);
    executor
}

/// Point pkg-config at the configured search path
///
/// System include and library directories are kept in the reported flags so
/// a `-I/usr/include` descriptor still yields an include flag.
pub fn configure_pkg_config_env(executor: &mut SystemCommandExecutor, settings: &PkgConfigSettings) {
    executor.set_env("PKG_CONFIG_PATH", settings.search_path_env());
    executor.set_env("PKG_CONFIG_ALLOW_SYSTEM_CFLAGS", "1");
    executor.set_env("PKG_CONFIG_ALLOW_SYSTEM_LIBS", "1");
}
