//! Command executor module.
//!
//! The only I/O primitive the services use to talk to the host: structured
//! argument-vector invocations (never shell strings), optional privilege
//! escalation, external deadlines, and a scripted runner for tests.

mod privilege;
mod scripted;
mod subprocess;
mod timeout;

pub use privilege::PrivilegeWrapper;
pub use scripted::ScriptedRunner;
pub use subprocess::{split_lines, CommandLine, CommandResult, CommandRunner, SystemRunner};
pub use timeout::{run_with_deadline, sanitize_output, DeadlineRunner};
