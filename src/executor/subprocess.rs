//! Synchronous subprocess execution.
//!
//! Provides utilities for running external commands safely with:
//! - No shell interpretation (direct exec of an argument vector)
//! - Captured stdout/stderr, kept separate
//! - A configurable privilege-escalation prefix

use std::fmt;
use std::process::{Command, Output, Stdio};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use super::privilege::PrivilegeWrapper;
use super::timeout::sanitize_output;

/// A program plus its argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Start a command line for the given program.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// The file name of the program (`/usr/sbin/ufw` -> `ufw`).
    pub fn program_name(&self) -> &str {
        self.program.rsplit('/').next().unwrap_or(&self.program)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
    /// The exit code, if available.
    pub exit_code: Option<i32>,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
    /// Set when an external deadline expired before the command finished.
    pub timed_out: bool,
}

impl CommandResult {
    /// Create a CommandResult from a std::process::Output.
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            timed_out: false,
        }
    }

    /// A successful result with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
            timed_out: false,
        }
    }

    /// A failed result with the given stderr.
    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(1),
            stdout: String::new(),
            stderr: stderr.into(),
            timed_out: false,
        }
    }

    /// The program could not be started at all (usually: tool not installed).
    pub fn spawn_failure(program: &str, error: &std::io::Error) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: format!("Failed to spawn {}: {}", program, error),
            timed_out: false,
        }
    }

    /// The caller's deadline expired.
    pub fn deadline_expired(command: &CommandLine, secs: u64) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: format!("{} did not finish within {} seconds", command, secs),
            timed_out: true,
        }
    }

    /// Trimmed, non-empty stdout lines.
    pub fn stdout_lines(&self) -> Vec<String> {
        split_lines(&self.stdout)
    }
}

/// Anything that can execute a [`CommandLine`].
///
/// Implementations never fail through `Err`: a missing tool or a non-zero
/// exit is a `CommandResult` with `success == false`.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &CommandLine) -> CommandResult;
}

/// Runs commands on the host.
pub struct SystemRunner {
    privilege: PrivilegeWrapper,
}

impl SystemRunner {
    /// Create a runner that prefixes every command with `privilege`.
    pub fn new(privilege: PrivilegeWrapper) -> Self {
        Self { privilege }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(PrivilegeWrapper::none())
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandLine) -> CommandResult {
        let wrapped = self.privilege.wrap(command);

        debug!(
            program = %wrapped.program,
            args = ?wrapped.args,
            "Executing subprocess"
        );

        let start = Instant::now();
        let output = Command::new(&wrapped.program)
            .args(&wrapped.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(output) => {
                let result = CommandResult::from_output(output);
                debug!(
                    success = result.success,
                    exit_code = ?result.exit_code,
                    duration_ms = start.elapsed().as_millis(),
                    "Subprocess completed"
                );
                if !result.success {
                    debug!(stderr = %sanitize_output(&result.stderr, 5), "Subprocess stderr");
                }
                result
            }
            Err(e) => {
                warn!(program = %wrapped.program, error = %e, "Failed to spawn subprocess");
                CommandResult::spawn_failure(&wrapped.program, &e)
            }
        }
    }
}

/// Split command output into trimmed, non-empty lines, preserving order.
pub fn split_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_echo() {
        let runner = SystemRunner::default();
        let result = runner.run(&CommandLine::new("echo").args(["hello", "world"]));
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout.trim(), "hello world");
    }

    #[test]
    fn test_run_false_command() {
        let runner = SystemRunner::default();
        let result = runner.run(&CommandLine::new("false"));
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(1));
    }

    #[test]
    fn test_nonexistent_command_is_soft_failure() {
        let runner = SystemRunner::default();
        let result = runner.run(&CommandLine::new("nonexistent_command_12345"));
        assert!(!result.success);
        assert_eq!(result.exit_code, None);
        assert!(result.stderr.contains("Failed to spawn"));
    }

    #[test]
    fn test_stderr_not_merged_into_stdout() {
        let runner = SystemRunner::default();
        let result = runner.run(&CommandLine::new("sh").args(["-c", "echo out; echo err >&2"]));
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
    }

    #[test]
    fn test_arguments_are_not_shell_interpreted() {
        let runner = SystemRunner::default();
        let result = runner.run(&CommandLine::new("echo").arg("$HOME; rm -rf /"));
        assert_eq!(result.stdout.trim(), "$HOME; rm -rf /");
    }

    #[test]
    fn test_split_lines() {
        let lines = split_lines("  one \n\n two\n   \nthree");
        assert_eq!(lines, vec!["one", "two", "three"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_display_and_program_name() {
        let cmd = CommandLine::new("/usr/sbin/ufw").args(["allow", "80/tcp"]);
        assert_eq!(cmd.to_string(), "/usr/sbin/ufw allow 80/tcp");
        assert_eq!(cmd.program_name(), "ufw");
    }
}
