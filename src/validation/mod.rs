//! Input validation module.
//!
//! Provides validators for domains, pool names, document roots, certificate
//! paths, PHP versions, firewall ports and protocols. Failing validation is
//! a caller contract violation and surfaces as a hard error.

mod domain;
mod php_version;
mod port;
mod template_context;

pub use domain::{validate_domain, validate_pool_name};
pub use php_version::{PhpVersions, ALLOWED_PHP_VERSIONS};
pub use port::{validate_port, validate_protocol, PortSpec, Protocol};
pub use template_context::{
    validate_document_root, validate_ssl_certificate, validate_ssl_certificate_key,
};
