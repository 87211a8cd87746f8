//! PHP version validation.

use std::collections::BTreeSet;

use crate::config::WhitelistsConfig;
use crate::error::{OrchestratorError, ValidationErrorKind};

/// PHP versions with FPM packages on both supported OS families.
pub const ALLOWED_PHP_VERSIONS: &[&str] = &["7.4", "8.0", "8.1", "8.2", "8.3", "8.4"];

/// The PHP versions this host may run: the built-in list plus configured
/// extras.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhpVersions {
    additional: BTreeSet<String>,
}

impl PhpVersions {
    /// Built-in versions only.
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn with_additional<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let additional = versions
            .into_iter()
            .map(Into::into)
            .filter(|v: &String| !ALLOWED_PHP_VERSIONS.contains(&v.as_str()))
            .collect();
        Self { additional }
    }

    pub fn from_config(config: &WhitelistsConfig) -> Self {
        Self::with_additional(config.additional_php_versions.iter().cloned())
    }

    pub fn contains(&self, version: &str) -> bool {
        ALLOWED_PHP_VERSIONS.contains(&version) || self.additional.contains(version)
    }

    /// Built-in versions in release order, then extras sorted.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        ALLOWED_PHP_VERSIONS
            .iter()
            .copied()
            .chain(self.additional.iter().map(String::as_str))
    }

    /// Validate that a PHP version is built-in or configured.
    pub fn validate(&self, version: &str) -> Result<(), OrchestratorError> {
        if self.contains(version) {
            return Ok(());
        }

        Err(OrchestratorError::Validation {
            kind: ValidationErrorKind::InvalidPhpVersion {
                version: version.to_string(),
            },
        })
    }
}
