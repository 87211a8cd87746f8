//! Firewall port and protocol validation.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{OrchestratorError, ValidationErrorKind};

/// Transport protocol of a firewall rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_protocol(s)
    }
}

/// A single port or an inclusive port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub start: u16,
    pub end: Option<u16>,
}

impl PortSpec {
    /// Port notation understood by ufw (`6000:6010`).
    pub fn ufw_notation(&self) -> String {
        match self.end {
            Some(end) => format!("{}:{}", self.start, end),
            None => self.start.to_string(),
        }
    }

    /// Port notation understood by firewall-cmd (`6000-6010`).
    pub fn firewalld_notation(&self) -> String {
        match self.end {
            Some(end) => format!("{}-{}", self.start, end),
            None => self.start.to_string(),
        }
    }
}

fn invalid_port(port: &str) -> OrchestratorError {
    OrchestratorError::Validation {
        kind: ValidationErrorKind::InvalidPort {
            port: port.to_string(),
        },
    }
}

fn parse_port_number(value: &str, original: &str) -> Result<u16, OrchestratorError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid_port(original));
    }
    match value.parse::<u16>() {
        Ok(0) | Err(_) => Err(invalid_port(original)),
        Ok(port) => Ok(port),
    }
}

/// Validate a port (`8080`) or range (`6000:6010` / `6000-6010`).
pub fn validate_port(port: &str) -> Result<PortSpec, OrchestratorError> {
    let trimmed = port.trim();
    match trimmed.split_once([':', '-']) {
        Some((start, end)) => {
            let start = parse_port_number(start, port)?;
            let end = parse_port_number(end, port)?;
            if end <= start {
                return Err(invalid_port(port));
            }
            Ok(PortSpec {
                start,
                end: Some(end),
            })
        }
        None => Ok(PortSpec {
            start: parse_port_number(trimmed, port)?,
            end: None,
        }),
    }
}

/// Validate a protocol name (case-insensitive `tcp` or `udp`).
pub fn validate_protocol(protocol: &str) -> Result<Protocol, OrchestratorError> {
    match protocol.trim().to_lowercase().as_str() {
        "tcp" => Ok(Protocol::Tcp),
        "udp" => Ok(Protocol::Udp),
        _ => Err(OrchestratorError::Validation {
            kind: ValidationErrorKind::InvalidProtocol {
                protocol: protocol.to_string(),
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_ports() {
        assert_eq!(validate_port("22").unwrap(), PortSpec { start: 22, end: None });
        assert_eq!(validate_port("65535").unwrap().start, 65535);
    }

    #[test]
    fn test_ranges_in_both_notations() {
        let colon = validate_port("6000:6010").unwrap();
        let dash = validate_port("6000-6010").unwrap();
        assert_eq!(colon, dash);
        assert_eq!(colon.ufw_notation(), "6000:6010");
        assert_eq!(colon.firewalld_notation(), "6000-6010");
    }

    #[test]
    fn test_invalid_ports() {
        assert!(validate_port("").is_err());
        assert!(validate_port("0").is_err());
        assert!(validate_port("65536").is_err());
        assert!(validate_port("http").is_err());
        assert!(validate_port("80/tcp").is_err());
        assert!(validate_port("9000:8000").is_err());
        assert!(validate_port("80; reboot").is_err());
        assert!(validate_port("+80").is_err());
    }

    #[test]
    fn test_protocols() {
        assert_eq!(validate_protocol("tcp").unwrap(), Protocol::Tcp);
        assert_eq!(validate_protocol("UDP").unwrap(), Protocol::Udp);
        assert!(validate_protocol("icmp").is_err());
        assert!(validate_protocol("").is_err());
    }
}
