//! Configuration settings for the Lumo orchestrator.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::OrchestratorError;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/lumo/orchestrator.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub privilege: PrivilegeConfig,
    #[serde(default)]
    pub os: OsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub whitelists: WhitelistsConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Privilege escalation for shelled-out commands.
#[derive(Debug, Clone, Deserialize)]
pub struct PrivilegeConfig {
    /// Argument vector prepended to every command (empty = none).
    #[serde(default = "default_privilege_wrapper")]
    pub wrapper: Vec<String>,
    /// Drop the wrapper when already running as root.
    #[serde(default = "default_skip_when_root")]
    pub skip_when_root: bool,
}

/// OS detection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OsConfig {
    /// Force an OS family ("debian" or "rhel") instead of detecting it.
    pub family: Option<String>,
    /// RHEL release marker file.
    #[serde(default = "default_rhel_release_path")]
    pub rhel_release_path: PathBuf,
    /// Generic os-release file.
    #[serde(default = "default_os_release_path")]
    pub os_release_path: PathBuf,
}

/// Filesystem roots.
///
/// `nginx_root` and `php_root` re-base the OS convention directories
/// (`/etc/nginx/...`, `/etc/php/...`) under another directory, which is
/// how staging hosts and tests redirect writes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    pub nginx_root: Option<PathBuf>,
    pub php_root: Option<PathBuf>,
    /// Directory of `.tera` files overriding the built-in templates.
    pub templates_dir: Option<PathBuf>,
}

/// Health monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Seconds between two health snapshots in watch mode.
    #[serde(default = "default_health_interval")]
    pub interval_seconds: u64,
    /// Deadline applied to each status command.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
}

/// Configurable whitelists for extending default allowed values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhitelistsConfig {
    /// Additional allowed PHP versions (beyond the built-in list).
    #[serde(default)]
    pub additional_php_versions: Vec<String>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_privilege_wrapper() -> Vec<String> {
    vec!["sudo".to_string(), "-n".to_string()]
}

fn default_skip_when_root() -> bool {
    true
}

fn default_rhel_release_path() -> PathBuf {
    PathBuf::from("/etc/redhat-release")
}

fn default_os_release_path() -> PathBuf {
    PathBuf::from("/etc/os-release")
}

fn default_health_interval() -> u64 {
    30
}

fn default_command_timeout() -> u64 {
    10
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for PrivilegeConfig {
    fn default() -> Self {
        Self {
            wrapper: default_privilege_wrapper(),
            skip_when_root: default_skip_when_root(),
        }
    }
}

impl Default for OsConfig {
    fn default() -> Self {
        Self {
            family: None,
            rhel_release_path: default_rhel_release_path(),
            os_release_path: default_os_release_path(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_health_interval(),
            command_timeout_seconds: default_command_timeout(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, OrchestratorError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| OrchestratorError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        Self::from_toml(&content).map_err(|e| OrchestratorError::Config {
            message: format!("Invalid config file '{}': {}", path.display(), e),
        })
    }

    /// Load settings from `path` if it exists, otherwise use defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, OrchestratorError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, OrchestratorError> {
        let settings: Settings = toml::from_str(content).map_err(|e| OrchestratorError::Config {
            message: format!("Failed to parse configuration: {}", e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), OrchestratorError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(OrchestratorError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(OrchestratorError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.privilege.wrapper.iter().any(|part| part.trim().is_empty()) {
            return Err(OrchestratorError::Config {
                message: "Privilege wrapper entries cannot be empty".to_string(),
            });
        }

        if let Some(family) = &self.os.family {
            let valid_families = ["debian", "rhel"];
            if !valid_families.contains(&family.to_lowercase().as_str()) {
                return Err(OrchestratorError::Config {
                    message: format!(
                        "Invalid OS family '{}'. Valid families: {:?}",
                        family, valid_families
                    ),
                });
            }
        }

        if self.health.interval_seconds == 0 || self.health.command_timeout_seconds == 0 {
            return Err(OrchestratorError::Config {
                message: "Health interval and command timeout must be positive".to_string(),
            });
        }

        Ok(())
    }
}
