//! Domain name validation.
//!
//! Validates domain names and PHP-FPM pool names used in generated configuration.

use crate::error::{OrchestratorError, ValidationErrorKind};

/// Maximum length for a domain name.
const MAX_DOMAIN_LENGTH: usize = 253;

/// Maximum length for a domain label (part between dots).
const MAX_LABEL_LENGTH: usize = 63;

fn invalid_domain(domain: &str, reason: impl Into<String>) -> OrchestratorError {
    OrchestratorError::Validation {
        kind: ValidationErrorKind::InvalidDomain {
            domain: domain.to_string(),
            reason: reason.into(),
        },
    }
}

/// Validates a server name.
///
/// # Rules
///
/// - 1-253 characters, at least two labels, no trailing dot
/// - Each label is 1-63 characters of `[A-Za-z0-9-]`
/// - Labels neither start nor end with a hyphen
/// - No wildcards
///
/// The domain ends up in file names and in `server_name`, so anything
/// else is refused rather than escaped.
pub fn validate_domain(domain: &str) -> Result<&str, OrchestratorError> {
    if domain.is_empty() {
        return Err(invalid_domain(domain, "domain name cannot be empty"));
    }
    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err(invalid_domain(
            domain,
            format!("longer than {} characters", MAX_DOMAIN_LENGTH),
        ));
    }
    if domain.contains('*') {
        return Err(invalid_domain(domain, "wildcard domains are not allowed"));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid_domain(domain, "needs at least two labels (e.g. example.com)"));
    }

    for label in labels {
        if label.is_empty() {
            return Err(invalid_domain(domain, "empty label"));
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(invalid_domain(
                domain,
                format!("label '{}' longer than {} characters", label, MAX_LABEL_LENGTH),
            ));
        }
        if let Some(c) = label.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
            return Err(invalid_domain(
                domain,
                format!("label '{}' contains invalid character '{}'", label, c),
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid_domain(
                domain,
                format!("label '{}' starts or ends with a hyphen", label),
            ));
        }
    }

    Ok(domain)
}

/// Maximum length for a PHP-FPM pool name.
const MAX_POOL_NAME_LENGTH: usize = 32;

/// Validates a PHP-FPM pool name.
///
/// # Rules
///
/// - Must be 1-32 characters
/// - Can contain alphanumeric characters, dashes, and underscores
/// - Must start with a letter
///
/// The name becomes part of a file name, a socket path and a `[section]`
/// header, so dots and slashes are rejected.
pub fn validate_pool_name(pool: &str) -> Result<&str, OrchestratorError> {
    let invalid = |message: String| OrchestratorError::Validation {
        kind: ValidationErrorKind::InvalidParameter {
            param: "pool_name".to_string(),
            message,
        },
    };

    let Some(first_char) = pool.chars().next() else {
        return Err(invalid("Pool name cannot be empty".to_string()));
    };

    if pool.len() > MAX_POOL_NAME_LENGTH {
        return Err(invalid(format!(
            "Pool name exceeds maximum length of {} characters",
            MAX_POOL_NAME_LENGTH
        )));
    }

    if !first_char.is_ascii_alphabetic() {
        return Err(invalid("Pool name must start with a letter".to_string()));
    }

    if let Some(c) = pool
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
    {
        return Err(invalid(format!("Pool name contains invalid character '{}'", c)));
    }

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_domains() {
        assert!(validate_domain("example.com").is_ok());
        assert!(validate_domain("sub.example.com").is_ok());
        assert!(validate_domain("my-site.example.org").is_ok());
        assert!(validate_domain("a1.b2.c3.example.net").is_ok());
    }

    #[test]
    fn test_invalid_domains() {
        // Empty
        assert!(validate_domain("").is_err());
        // No TLD
        assert!(validate_domain("localhost").is_err());
        // Wildcard
        assert!(validate_domain("*.example.com").is_err());
        // Invalid characters
        assert!(validate_domain("example_site.com").is_err());
        assert!(validate_domain("example site.com").is_err());
        // Starting with hyphen
        assert!(validate_domain("-example.com").is_err());
        // Ending with hyphen
        assert!(validate_domain("example-.com").is_err());
        // Empty label
        assert!(validate_domain("example..com").is_err());
        // Trailing dot
        assert!(validate_domain("example.com.").is_err());
    }

    #[test]
    fn test_domain_error_kind() {
        let err = validate_domain("bad domain.com").unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Validation {
                kind: ValidationErrorKind::InvalidDomain { .. }
            }
        ));
        assert!(err.to_string().contains("bad domain.com"));
    }

    #[test]
    fn test_valid_pool_names() {
        assert!(validate_pool_name("shop").is_ok());
        assert!(validate_pool_name("example_com").is_ok());
        assert!(validate_pool_name("blog-2").is_ok());
    }

    #[test]
    fn test_invalid_pool_names() {
        assert!(validate_pool_name("").is_err());
        assert!(validate_pool_name("2shop").is_err());
        assert!(validate_pool_name("example.com").is_err());
        assert!(validate_pool_name("../www").is_err());
        assert!(validate_pool_name("pool]\nuser=root").is_err());
        assert!(validate_pool_name(&"a".repeat(33)).is_err());
    }
}
