//! Error types for the Lumo orchestrator.
//!
//! Only contract violations travel through these types. Environmental
//! failures (missing tool, non-zero exit, failed syntax test) are reported
//! inside an [`OperationResult`](crate::result::OperationResult) instead.

use thiserror::Error;

/// Main error type for the orchestrator.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors (caller passed malformed input).
    #[error("Validation error: {kind}")]
    Validation { kind: ValidationErrorKind },

    /// The operation is not supported by the target.
    #[error("Unsupported operation: {operation} is not supported by {target}")]
    Unsupported { operation: String, target: String },

    /// Template-related errors.
    #[error("Template error: {message}")]
    Template { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OrchestratorError {
    /// Shorthand for an `InvalidParameter` validation error.
    pub fn invalid(param: &str, message: impl Into<String>) -> Self {
        OrchestratorError::Validation {
            kind: ValidationErrorKind::InvalidParameter {
                param: param.to_string(),
                message: message.into(),
            },
        }
    }

    /// Whether this error is the "unsupported operation" signal.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, OrchestratorError::Unsupported { .. })
    }
}

/// Validation error kinds.
#[derive(Error, Debug)]
pub enum ValidationErrorKind {
    #[error("Invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },

    #[error("Service not recognized: {service}")]
    UnknownService { service: String },

    #[error("Missing required parameter: {param}")]
    MissingParameter { param: String },

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Unsupported PHP version: {version}")]
    InvalidPhpVersion { version: String },

    #[error("Invalid port: {port}")]
    InvalidPort { port: String },

    #[error("Invalid protocol '{protocol}' (expected tcp or udp)")]
    InvalidProtocol { protocol: String },
}

/// Result type alias for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
