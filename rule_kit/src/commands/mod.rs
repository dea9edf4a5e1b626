//! # Command Executor Configurations

pub mod debian;

pub use debian::{configure_pkg_config_env, create_debian_command_executor};
