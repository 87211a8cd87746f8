//! Configuration module for the Lumo orchestrator.
//!
//! Handles loading and validating configuration from TOML files.

mod settings;

pub use settings::*;
