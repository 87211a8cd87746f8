//! OS family detection.
//!
//! Reads the RHEL release marker and `/etc/os-release`. No commands are run
//! and read errors count as "file absent", so detection always yields a
//! family (Debian by default).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::config::OsConfig;

use super::family::OsFamily;

const DEFAULT_RHEL_RELEASE: &str = "/etc/redhat-release";
const DEFAULT_OS_RELEASE: &str = "/etc/os-release";

fn rhel_like_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)rhel|fedora|rocky|alma|centos").expect("static regex is valid")
    })
}

/// Classify a host from its release files.
pub fn detect_os_family(rhel_release: &Path, os_release: &Path) -> OsFamily {
    if rhel_release.is_file() {
        debug!(path = %rhel_release.display(), "RHEL release marker found");
        return OsFamily::RhelLike;
    }

    if let Ok(content) = fs::read_to_string(os_release) {
        if os_release_is_rhel_like(&content) {
            debug!(path = %os_release.display(), "os-release identifies a RHEL-like system");
            return OsFamily::RhelLike;
        }
    }

    OsFamily::Debian
}

/// Whether the `ID` or `ID_LIKE` fields of an os-release file name a
/// RHEL-like distribution.
pub fn os_release_is_rhel_like(content: &str) -> bool {
    content
        .lines()
        .filter_map(|line| line.trim().split_once('='))
        .filter(|(key, _)| matches!(key.trim(), "ID" | "ID_LIKE"))
        .map(|(_, value)| value.trim().trim_matches('"').trim_matches('\''))
        .any(|value| rhel_like_pattern().is_match(value))
}

/// Detector bound to configurable file locations, memoized per instance.
#[derive(Debug)]
pub struct OsDetector {
    rhel_release_path: PathBuf,
    os_release_path: PathBuf,
    forced: Option<OsFamily>,
    resolved: OnceLock<OsFamily>,
}

impl OsDetector {
    pub fn new(rhel_release_path: impl Into<PathBuf>, os_release_path: impl Into<PathBuf>) -> Self {
        Self {
            rhel_release_path: rhel_release_path.into(),
            os_release_path: os_release_path.into(),
            forced: None,
            resolved: OnceLock::new(),
        }
    }

    /// A detector that always answers `family`.
    pub fn fixed(family: OsFamily) -> Self {
        let mut detector = Self::new(DEFAULT_RHEL_RELEASE, DEFAULT_OS_RELEASE);
        detector.forced = Some(family);
        detector
    }

    /// Build a detector from configuration. An explicit family wins.
    pub fn from_config(config: &OsConfig) -> Self {
        let mut detector = Self::new(&config.rhel_release_path, &config.os_release_path);
        detector.forced = config.family.as_deref().and_then(|f| f.parse().ok());
        detector
    }

    /// Resolve the family. The first answer sticks for the detector's lifetime.
    pub fn detect(&self) -> OsFamily {
        *self.resolved.get_or_init(|| {
            let family = self.forced.unwrap_or_else(|| {
                detect_os_family(&self.rhel_release_path, &self.os_release_path)
            });
            debug!(family = %family, "OS family resolved");
            family
        })
    }
}
