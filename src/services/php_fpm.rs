//! PHP-FPM service definition.

use crate::os::{php_fpm_unit, OsFamily};
use crate::php::php_service_key;

use super::traits::ServiceDefinition;

/// PHP-FPM of one PHP version.
pub struct PhpFpmService {
    version: String,
    key: String,
    display_name: String,
}

impl PhpFpmService {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            key: php_service_key(version),
            display_name: format!("PHP {} FPM", version),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl ServiceDefinition for PhpFpmService {
    fn key(&self) -> &str {
        &self.key
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn icon(&self) -> &'static str {
        "php"
    }

    fn unit(&self, os: OsFamily) -> String {
        php_fpm_unit(os, &self.version)
    }
}
