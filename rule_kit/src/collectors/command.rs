//! # Subprocess Oracle
//!
//! Runs external programs (consumer binaries, `ldd`, `pkg-config`,
//! `dpkg-query`) with a whitelist, a sanitized environment and a bounded
//! wait. A non-zero exit status is a normal [`CommandOutput`]; only a
//! failure to start or finish the program is a [`LaunchError`].

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default bound on every subprocess invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Restricted PATH handed to every child process
const RESTRICTED_PATH: &str = "/usr/bin:/bin:/usr/sbin:/sbin";

/// Command execution output
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Subprocess launch errors
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Program not found: {program}")]
    ProgramNotFound { program: String },

    #[error("Permission denied: {program}")]
    PermissionDenied { program: String },

    #[error("Execution failed for '{program}': {reason}")]
    ExecutionFailed { program: String, reason: String },

    #[error("'{program}' did not complete within {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("Command '{program}' not in whitelist")]
    NotWhitelisted { program: String },
}

/// Executes external programs and reports how they exited
pub trait SubprocessOracle: Send + Sync {
    /// Run `program` with `args`, optionally from `working_dir`
    fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput, LaunchError>;
}

/// Executes system commands with security controls and timeout enforcement
#[derive(Clone)]
pub struct SystemCommandExecutor {
    default_timeout: Duration,
    allowed_commands: HashSet<String>,
    env: Vec<(String, String)>,
}

impl SystemCommandExecutor {
    /// Create executor with empty whitelist - must be configured before use
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create executor with custom timeout and empty whitelist
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            default_timeout: timeout,
            allowed_commands: HashSet::new(),
            env: Vec::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Add command to whitelist
    pub fn allow_command(&mut self, command: impl Into<String>) {
        self.allowed_commands.insert(command.into());
    }

    /// Add multiple commands to whitelist
    pub fn allow_commands(&mut self, commands: &[&str]) {
        for cmd in commands {
            self.allowed_commands.insert(cmd.to_string());
        }
    }

    /// Check if command is whitelisted
    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed_commands.contains(command)
    }

    /// Set an environment variable on every child (on top of PATH)
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.env.retain(|(k, _)| *k != key);
        self.env.push((key, value.into()));
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Execute command with timeout and capture output
    pub fn execute(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, LaunchError> {
        if !self.allowed_commands.contains(program) {
            return Err(LaunchError::NotWhitelisted {
                program: program.to_string(),
            });
        }

        let timeout_duration = timeout.unwrap_or(self.default_timeout);
        let start = Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .env_clear()
            .env("PATH", RESTRICTED_PATH)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LaunchError::ProgramNotFound {
                program: program.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => LaunchError::PermissionDenied {
                program: program.to_string(),
            },
            _ => LaunchError::ExecutionFailed {
                program: program.to_string(),
                reason: e.to_string(),
            },
        })?;

        // Drain both pipes while waiting so a chatty child cannot fill them
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let result =
            wait_timeout::ChildExt::wait_timeout(&mut child, timeout_duration).map_err(|e| {
                LaunchError::ExecutionFailed {
                    program: program.to_string(),
                    reason: e.to_string(),
                }
            })?;

        match result {
            Some(status) => Ok(CommandOutput {
                stdout: collect_reader(stdout),
                stderr: collect_reader(stderr),
                exit_code: status.code().unwrap_or(-1),
                duration: start.elapsed(),
            }),
            None => {
                // Timeout - kill and reap; readers are left detached since a
                // grandchild may still hold the pipes open
                let _ = child.kill();
                let _ = child.wait();
                Err(LaunchError::Timeout {
                    program: program.to_string(),
                    timeout_ms: timeout_duration.as_millis() as u64,
                })
            }
        }
    }
}

/// Read a child pipe to EOF on its own thread
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SubprocessOracle for SystemCommandExecutor {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput, LaunchError> {
        crate::log_debug!("Running subprocess", "program" => program, "args" => args.join(" "));
        self.execute(program, args, working_dir, None)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_whitelist() {
        let executor = SystemCommandExecutor::new();
        assert!(!executor.is_allowed("ldd"));
        assert!(!executor.is_allowed("pkg-config"));
    }

    #[test]
    fn test_whitelist_management() {
        let mut executor = SystemCommandExecutor::new();

        executor.allow_command("ldd");
        assert!(executor.is_allowed("ldd"));
        assert!(!executor.is_allowed("dpkg-query"));

        executor.allow_commands(&["dpkg-query", "pkg-config"]);
        assert!(executor.is_allowed("dpkg-query"));
        assert!(executor.is_allowed("pkg-config"));
    }

    #[test]
    fn test_not_whitelisted() {
        let executor = SystemCommandExecutor::new();
        let result = executor.run("rm", &["-rf", "/"], None);

        match result {
            Err(LaunchError::NotWhitelisted { program }) => assert_eq!(program, "rm"),
            other => panic!("Expected NotWhitelisted, got {:?}", other),
        }
    }

    #[cfg(unix)]
    mod unix_tests {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        fn shell_executor(timeout: Duration) -> SystemCommandExecutor {
            let mut executor = SystemCommandExecutor::with_timeout(timeout);
            executor.allow_command("/bin/sh");
            executor
        }

        #[test]
        fn test_nonzero_exit_is_not_an_error() {
            let executor = shell_executor(DEFAULT_TIMEOUT);
            let output = executor.run("/bin/sh", &["-c", "echo out; exit 3"], None).unwrap();

            assert_eq!(output.exit_code, 3);
            assert!(!output.success());
            assert_eq!(output.stdout.trim(), "out");
        }

        #[test]
        fn test_working_dir_and_env() {
            let dir = tempfile::tempdir().unwrap();
            let mut executor = shell_executor(DEFAULT_TIMEOUT);
            executor.set_env("CALC_MARKER", "first");
            executor.set_env("CALC_MARKER", "second");

            let output = executor
                .run("/bin/sh", &["-c", "pwd; echo $CALC_MARKER"], Some(dir.path()))
                .unwrap();

            let lines: Vec<&str> = output.stdout.lines().collect();
            assert_eq!(
                fs::canonicalize(lines[0]).unwrap(),
                fs::canonicalize(dir.path()).unwrap()
            );
            assert_eq!(lines[1], "second");
        }

        #[test]
        fn test_timeout_kills_child() {
            let executor = shell_executor(Duration::from_millis(200));
            let start = Instant::now();
            let result = executor.run("/bin/sh", &["-c", "sleep 10"], None);

            assert!(matches!(result, Err(LaunchError::Timeout { .. })));
            assert!(start.elapsed() < Duration::from_secs(5));
        }

        #[test]
        fn test_large_output_is_fully_captured() {
            let executor = shell_executor(Duration::from_secs(3));
            let output = executor
                .run(
                    "/bin/sh",
                    &["-c", "head -c 150000 /dev/zero | tr '\\0' a; echo done >&2"],
                    None,
                )
                .unwrap();

            assert!(output.success());
            assert_eq!(output.stdout.len(), 150_000);
            assert!(output.stdout.bytes().all(|b| b == b'a'));
            assert_eq!(output.stderr.trim(), "done");
        }

        #[test]
        fn test_missing_program() {
            let mut executor = SystemCommandExecutor::new();
            executor.allow_command("/definitely/missing/consumer");
            let result = executor.run("/definitely/missing/consumer", &[], None);

            assert!(matches!(result, Err(LaunchError::ProgramNotFound { .. })));
        }

        #[test]
        fn test_non_executable_program() {
            let dir = tempfile::tempdir().unwrap();
            let consumer = dir.path().join("consumer");
            fs::write(&consumer, "#!/bin/sh\nexit 0\n").unwrap();
            fs::set_permissions(&consumer, fs::Permissions::from_mode(0o644)).unwrap();

            let program = consumer.to_str().unwrap();
            let mut executor = SystemCommandExecutor::new();
            executor.allow_command(program);

            assert!(matches!(
                executor.run(program, &[], None),
                Err(LaunchError::PermissionDenied { .. })
            ));
        }
    }
}
