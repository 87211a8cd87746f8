//! External deadlines for command execution.
//!
//! Commands have no built-in timeout. Callers that need bounded latency
//! (such as the health monitor) wrap their runner in a [`DeadlineRunner`];
//! an expired deadline is reported as a failed `CommandResult` and is never
//! retried.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use super::subprocess::{CommandLine, CommandResult, CommandRunner};

/// Run a command on `runner`, giving up after `deadline`.
///
/// The command runs on a worker thread. If the deadline expires, the worker
/// keeps running in the background until the child exits; only the caller
/// stops waiting.
pub fn run_with_deadline(
    runner: Arc<dyn CommandRunner>,
    command: &CommandLine,
    deadline: Duration,
) -> CommandResult {
    let (tx, rx) = mpsc::channel();
    let worker_command = command.clone();

    thread::spawn(move || {
        let result = runner.run(&worker_command);
        // Ignore send errors (receiver may have dropped on timeout)
        let _ = tx.send(result);
    });

    match rx.recv_timeout(deadline) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(
                command = %command,
                deadline_secs = deadline.as_secs(),
                "Command deadline expired"
            );
            CommandResult::deadline_expired(command, deadline.as_secs())
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            CommandResult::failure(format!("{} worker thread panicked", command))
        }
    }
}

/// A runner that applies a fixed deadline to every command.
pub struct DeadlineRunner {
    inner: Arc<dyn CommandRunner>,
    deadline: Duration,
}

impl DeadlineRunner {
    pub fn new(inner: Arc<dyn CommandRunner>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

impl CommandRunner for DeadlineRunner {
    fn run(&self, command: &CommandLine) -> CommandResult {
        run_with_deadline(Arc::clone(&self.inner), command, self.deadline)
    }
}

/// Sanitize command output for inclusion in log lines.
///
/// This function:
/// - Truncates long lines
/// - Limits the number of lines shown
/// - Caps the total length
pub fn sanitize_output(output: &str, max_lines: usize) -> String {
    const MAX_LINE_LENGTH: usize = 200;
    const MAX_TOTAL_LENGTH: usize = 1000;

    let mut result = String::new();

    for line in output.lines().take(max_lines) {
        let truncated = if line.chars().count() > MAX_LINE_LENGTH {
            let cut: String = line.chars().take(MAX_LINE_LENGTH).collect();
            format!("{}...", cut)
        } else {
            line.to_string()
        };

        if result.len() + truncated.len() > MAX_TOTAL_LENGTH {
            result.push_str("...[truncated]");
            break;
        }

        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&truncated);
    }

    if output.lines().count() > max_lines {
        result.push_str("\n...[additional output truncated]");
    }

    result
}
