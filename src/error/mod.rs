//! Error types for the Lumo orchestrator.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
