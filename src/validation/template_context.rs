//! Site field validation for generated configuration.
//!
//! Values checked here are interpolated into nginx and PHP-FPM config text,
//! so anything that could terminate a directive or open a new one is refused.

use crate::error::{OrchestratorError, ValidationErrorKind};

/// Allowed prefixes for document root paths.
const ALLOWED_DOCROOT_PREFIXES: &[&str] = &["/var/www/", "/home/", "/srv/", "/usr/share/nginx/"];

/// Allowed prefixes for SSL certificate paths.
const ALLOWED_SSL_PREFIXES: &[&str] = &[
    "/etc/ssl/",
    "/etc/letsencrypt/",
    "/etc/nginx/ssl/",
    "/etc/pki/tls/",
];

/// Validates a document root path.
///
/// Must be absolute, under one of the allowed prefixes, and free of `..`,
/// NUL, newlines, semicolons, quotes and braces.
pub fn validate_document_root(path: &str) -> Result<&str, OrchestratorError> {
    validate_config_path(path, "document_root", ALLOWED_DOCROOT_PREFIXES)
}

/// Validates an SSL certificate path (`.pem`, `.crt` or `.cer`).
pub fn validate_ssl_certificate(path: &str) -> Result<&str, OrchestratorError> {
    let path = validate_config_path(path, "ssl_certificate", ALLOWED_SSL_PREFIXES)?;

    if !path.ends_with(".pem") && !path.ends_with(".crt") && !path.ends_with(".cer") {
        return Err(OrchestratorError::invalid(
            "ssl_certificate",
            "SSL certificate must end with .pem, .crt, or .cer",
        ));
    }

    Ok(path)
}

/// Validates an SSL certificate key path (`.pem` or `.key`).
pub fn validate_ssl_certificate_key(path: &str) -> Result<&str, OrchestratorError> {
    let path = validate_config_path(path, "ssl_certificate_key", ALLOWED_SSL_PREFIXES)?;

    if !path.ends_with(".pem") && !path.ends_with(".key") {
        return Err(OrchestratorError::invalid(
            "ssl_certificate_key",
            "SSL certificate key must end with .pem or .key",
        ));
    }

    Ok(path)
}

fn validate_config_path<'a>(
    path: &'a str,
    param_name: &str,
    allowed_prefixes: &[&str],
) -> Result<&'a str, OrchestratorError> {
    let invalid = |message: String| OrchestratorError::Validation {
        kind: ValidationErrorKind::InvalidParameter {
            param: param_name.to_string(),
            message,
        },
    };

    if path.is_empty() {
        return Err(OrchestratorError::Validation {
            kind: ValidationErrorKind::MissingParameter {
                param: param_name.to_string(),
            },
        });
    }

    if !path.starts_with('/') {
        return Err(invalid("Path must be absolute (start with /)".to_string()));
    }

    if path.contains("..") {
        return Err(invalid(
            "Path cannot contain path traversal sequences (..)".to_string(),
        ));
    }

    if let Some(c) = path
        .chars()
        .find(|c| matches!(c, '\0' | '\n' | '\r' | ';' | '{' | '}' | '"' | '\'' | ' '))
    {
        return Err(invalid(format!("Path contains forbidden character {:?}", c)));
    }

    if !allowed_prefixes.iter().any(|prefix| path.starts_with(prefix)) {
        return Err(invalid(format!(
            "Path must start with one of: {}",
            allowed_prefixes.join(", ")
        )));
    }

    Ok(path)
}
