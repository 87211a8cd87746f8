//! The site value object.
//!
//! Sites are owned by the website-management side of the panel; this crate
//! only reads them to generate nginx and PHP-FPM configuration.

mod framework;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::validation::{
    validate_document_root, validate_domain, validate_pool_name, validate_ssl_certificate,
    validate_ssl_certificate_key, PhpVersions,
};

pub use framework::Framework;

/// A website as seen by the configuration layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Primary server name.
    pub domain: String,
    /// Additional server names.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Directory served as the web root.
    pub document_root: String,
    /// PHP version serving the site, e.g. `8.3`.
    pub php_version: String,
    /// Dedicated PHP-FPM pool. `None` means the distribution's shared pool.
    #[serde(default)]
    pub pool_name: Option<String>,
    #[serde(default)]
    pub ssl_enabled: bool,
    /// Certificate chain; defaults to the Let's Encrypt live path.
    #[serde(default)]
    pub ssl_certificate: Option<String>,
    /// Certificate key; defaults to the Let's Encrypt live path.
    #[serde(default)]
    pub ssl_certificate_key: Option<String>,
    #[serde(default)]
    pub framework: Framework,
}

impl Site {
    pub fn new(domain: &str, document_root: &str, php_version: &str) -> Self {
        Self {
            domain: domain.to_string(),
            aliases: Vec::new(),
            document_root: document_root.to_string(),
            php_version: php_version.to_string(),
            pool_name: None,
            ssl_enabled: false,
            ssl_certificate: None,
            ssl_certificate_key: None,
            framework: Framework::default(),
        }
    }

    pub fn with_pool(mut self, pool_name: &str) -> Self {
        self.pool_name = Some(pool_name.to_string());
        self
    }

    pub fn with_ssl(mut self) -> Self {
        self.ssl_enabled = true;
        self
    }

    pub fn with_framework(mut self, framework: Framework) -> Self {
        self.framework = framework;
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Read a site description from a TOML file.
    pub fn from_toml_file(path: &Path) -> OrchestratorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| OrchestratorError::Config {
            message: format!("Invalid site file '{}': {}", path.display(), e),
        })
    }

    /// The dedicated pool name, if any.
    pub fn pool(&self) -> Option<&str> {
        self.pool_name.as_deref()
    }

    /// Certificate chain path used when SSL is enabled.
    pub fn certificate_path(&self) -> String {
        self.ssl_certificate
            .clone()
            .unwrap_or_else(|| format!("/etc/letsencrypt/live/{}/fullchain.pem", self.domain))
    }

    /// Certificate key path used when SSL is enabled.
    pub fn certificate_key_path(&self) -> String {
        self.ssl_certificate_key
            .clone()
            .unwrap_or_else(|| format!("/etc/letsencrypt/live/{}/privkey.pem", self.domain))
    }

    /// Check every field that ends up in generated configuration. The PHP
    /// version must be one of `php_versions`.
    pub fn validate(&self, php_versions: &PhpVersions) -> OrchestratorResult<()> {
        validate_domain(&self.domain)?;
        for alias in &self.aliases {
            validate_domain(alias)?;
        }
        validate_document_root(&self.document_root)?;
        php_versions.validate(&self.php_version)?;
        if let Some(pool) = &self.pool_name {
            validate_pool_name(pool)?;
        }
        if self.ssl_enabled {
            validate_ssl_certificate(&self.certificate_path())?;
            validate_ssl_certificate_key(&self.certificate_key_path())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> PhpVersions {
        PhpVersions::builtin()
    }

    #[test]
    fn test_valid_site() {
        let site = Site::new("example.com", "/var/www/example.com/public", "8.3")
            .with_pool("example")
            .with_ssl()
            .with_alias("www.example.com");
        assert!(site.validate(&builtin()).is_ok());
        assert_eq!(
            site.certificate_path(),
            "/etc/letsencrypt/live/example.com/fullchain.pem"
        );
    }

    #[test]
    fn test_invalid_fields_are_hard_errors() {
        let base = Site::new("example.com", "/var/www/example.com", "8.3");
        let versions = builtin();
        let no_domain = Site {
            domain: String::new(),
            ..base.clone()
        };
        assert!(no_domain.validate(&versions).is_err());
        let system_root = Site {
            document_root: "/etc".to_string(),
            ..base.clone()
        };
        assert!(system_root.validate(&versions).is_err());
        let old_php = Site {
            php_version: "5.2".to_string(),
            ..base.clone()
        };
        assert!(old_php.validate(&versions).is_err());
        assert!(base.clone().with_pool("bad.pool").validate(&versions).is_err());
        assert!(base.with_alias("*.example.com").validate(&versions).is_err());
    }

    #[test]
    fn test_custom_certificate_must_be_valid() {
        let mut site = Site::new("example.com", "/var/www/example.com", "8.3").with_ssl();
        site.ssl_certificate = Some("/tmp/cert.pem".to_string());
        assert!(site.validate(&builtin()).is_err());
    }

    #[test]
    fn test_configured_php_version_is_accepted() {
        let site = Site::new("example.com", "/var/www/example.com", "8.5");
        assert!(site.validate(&builtin()).is_err());
        assert!(site.validate(&PhpVersions::with_additional(["8.5"])).is_ok());
    }

    #[test]
    fn test_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        std::fs::write(
            &path,
            concat!(
                "domain = \"shop.example.com\"\n",
                "document_root = \"/var/www/shop/public\"\n",
                "php_version = \"8.2\"\n",
                "pool_name = \"shop\"\n",
                "framework = \"laravel\"\n",
            ),
        )
        .unwrap();
        let site = Site::from_toml_file(&path).unwrap();
        assert_eq!(site.pool(), Some("shop"));
        assert_eq!(site.framework, Framework::Laravel);
        assert!(!site.ssl_enabled);
    }
}
