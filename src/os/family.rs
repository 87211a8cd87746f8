//! The OS family enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// Linux distribution grouping that decides tools, paths and accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Debian, Ubuntu and derivatives.
    Debian,
    /// RHEL, CentOS, Rocky, Alma, Fedora.
    #[serde(rename = "rhel")]
    RhelLike,
}

impl OsFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            OsFamily::Debian => "debian",
            OsFamily::RhelLike => "rhel",
        }
    }

    /// Account the web server and PHP-FPM pools run as.
    pub fn web_user(self) -> &'static str {
        match self {
            OsFamily::Debian => "www-data",
            OsFamily::RhelLike => "nginx",
        }
    }

    /// Group the web server and PHP-FPM pools run as.
    pub fn web_group(self) -> &'static str {
        match self {
            OsFamily::Debian => "www-data",
            OsFamily::RhelLike => "nginx",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFamily {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debian" => Ok(OsFamily::Debian),
            "rhel" | "rhel-like" | "rhellike" => Ok(OsFamily::RhelLike),
            other => Err(OrchestratorError::invalid(
                "os_family",
                format!("unknown OS family '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_identity() {
        assert_eq!(OsFamily::Debian.web_user(), "www-data");
        assert_eq!(OsFamily::Debian.web_group(), "www-data");
        assert_eq!(OsFamily::RhelLike.web_user(), "nginx");
        assert_eq!(OsFamily::RhelLike.web_group(), "nginx");
    }

    #[test]
    fn test_parse() {
        assert_eq!("Debian".parse::<OsFamily>().unwrap(), OsFamily::Debian);
        assert_eq!("rhel".parse::<OsFamily>().unwrap(), OsFamily::RhelLike);
        assert!("arch".parse::<OsFamily>().is_err());
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&OsFamily::RhelLike).unwrap(), "\"rhel\"");
        assert_eq!(serde_json::to_string(&OsFamily::Debian).unwrap(), "\"debian\"");
    }
}
