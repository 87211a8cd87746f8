//! The uniform result envelope returned by every mutating operation.

use serde::Serialize;

use crate::executor::CommandResult;

/// Outcome of a mutating operation.
///
/// `message` is a human-readable summary of what was attempted; `output`
/// and `error` carry the raw stdout/stderr of the command that decided the
/// outcome, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    pub output: String,
    pub error: String,
}

impl OperationResult {
    /// A successful result with no command evidence.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            output: String::new(),
            error: String::new(),
        }
    }

    /// A failed result with an error description.
    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: String::new(),
            error: error.into(),
        }
    }

    /// Build a result from the command that decided the outcome.
    ///
    /// The message is chosen according to the command's success.
    pub fn from_command(
        result: &CommandResult,
        success_message: impl Into<String>,
        failure_message: impl Into<String>,
    ) -> Self {
        Self {
            success: result.success,
            message: if result.success {
                success_message.into()
            } else {
                failure_message.into()
            },
            output: result.stdout.trim().to_string(),
            error: result.stderr.trim().to_string(),
        }
    }

    /// Attach stdout evidence.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }
}
