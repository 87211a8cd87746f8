//! Path, binary and unit-name conventions per OS family.

use std::path::{Path, PathBuf};

use crate::validation::PhpVersions;

use super::family::OsFamily;

pub const SYSTEMCTL_BIN: &str = "/usr/bin/systemctl";
pub const NGINX_BIN: &str = "/usr/sbin/nginx";
pub const UFW_BIN: &str = "/usr/sbin/ufw";
pub const FIREWALL_CMD_BIN: &str = "/usr/bin/firewall-cmd";
pub const PS_BIN: &str = "/usr/bin/ps";

/// PHP version without dots, as used by the Remi packages (`8.3` -> `83`).
fn compact_version(version: &str) -> String {
    version.replace('.', "")
}

/// Absolute path of the PHP-FPM binary for `version`.
pub fn php_fpm_binary(os: OsFamily, version: &str) -> String {
    match os {
        OsFamily::Debian => format!("/usr/sbin/php-fpm{}", version),
        OsFamily::RhelLike => format!(
            "/opt/remi/php{}/root/usr/sbin/php-fpm",
            compact_version(version)
        ),
    }
}

/// Systemd unit running PHP-FPM `version`.
pub fn php_fpm_unit(os: OsFamily, version: &str) -> String {
    match os {
        OsFamily::Debian => format!("php{}-fpm", version),
        OsFamily::RhelLike => format!("php{}-php-fpm", compact_version(version)),
    }
}

/// Filesystem layout for an OS family.
///
/// Configuration directories can be re-based under another root (staging,
/// tests). Runtime paths that end up inside generated config text (sockets,
/// logs) are never re-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    os: OsFamily,
    nginx_root: Option<PathBuf>,
    php_root: Option<PathBuf>,
    php_versions: PhpVersions,
}

impl Layout {
    pub fn new(os: OsFamily) -> Self {
        Self {
            os,
            nginx_root: None,
            php_root: None,
            php_versions: PhpVersions::builtin(),
        }
    }

    /// Re-base nginx configuration directories under `root`.
    pub fn with_nginx_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.nginx_root = Some(root.into());
        self
    }

    /// Re-base PHP-FPM pool directories under `root`.
    pub fn with_php_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.php_root = Some(root.into());
        self
    }

    /// PHP versions installable on this host.
    pub fn with_php_versions(mut self, versions: PhpVersions) -> Self {
        self.php_versions = versions;
        self
    }

    pub fn os(&self) -> OsFamily {
        self.os
    }

    pub fn php_versions(&self) -> &PhpVersions {
        &self.php_versions
    }

    fn rebase(root: Option<&Path>, path: &str) -> PathBuf {
        match root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }

    /// Directory holding site config files.
    pub fn nginx_available_dir(&self) -> PathBuf {
        let dir = match self.os {
            OsFamily::Debian => "/etc/nginx/sites-available",
            OsFamily::RhelLike => "/etc/nginx/conf.d",
        };
        Self::rebase(self.nginx_root.as_deref(), dir)
    }

    /// Directory nginx includes site configs from.
    pub fn nginx_enabled_dir(&self) -> PathBuf {
        let dir = match self.os {
            OsFamily::Debian => "/etc/nginx/sites-enabled",
            OsFamily::RhelLike => "/etc/nginx/conf.d",
        };
        Self::rebase(self.nginx_root.as_deref(), dir)
    }

    /// File name of a site config.
    pub fn site_file_name(&self, domain: &str) -> String {
        match self.os {
            OsFamily::Debian => domain.to_string(),
            OsFamily::RhelLike => format!("{}.conf", domain),
        }
    }

    /// Where the site's config is written.
    pub fn site_config_path(&self, domain: &str) -> PathBuf {
        self.nginx_available_dir().join(self.site_file_name(domain))
    }

    /// The path whose presence makes nginx load the site.
    ///
    /// On Debian this is the symlink in `sites-enabled`; on RHEL the config
    /// file in `conf.d` is itself the activation.
    pub fn site_enabled_path(&self, domain: &str) -> PathBuf {
        self.nginx_enabled_dir().join(self.site_file_name(domain))
    }

    /// Where a disabled site's config is parked (RHEL only uses this).
    pub fn site_disabled_path(&self, domain: &str) -> PathBuf {
        match self.os {
            OsFamily::Debian => self.site_config_path(domain),
            OsFamily::RhelLike => self
                .nginx_available_dir()
                .join(format!("{}.conf.disabled", domain)),
        }
    }

    /// PHP-FPM pool directory for `version`.
    pub fn php_pool_dir(&self, version: &str) -> PathBuf {
        let dir = match self.os {
            OsFamily::Debian => format!("/etc/php/{}/fpm/pool.d", version),
            OsFamily::RhelLike => {
                format!("/etc/opt/remi/php{}/php-fpm.d", compact_version(version))
            }
        };
        Self::rebase(self.php_root.as_deref(), &dir)
    }

    /// Pool config file for `pool` under `version`.
    pub fn php_pool_path(&self, version: &str, pool: &str) -> PathBuf {
        self.php_pool_dir(version).join(format!("{}.conf", pool))
    }

    /// Socket of a PHP-FPM pool. `None` means the distribution's default pool.
    pub fn php_socket_path(&self, version: &str, pool: Option<&str>) -> PathBuf {
        match (self.os, pool) {
            (OsFamily::Debian, None) => PathBuf::from(format!("/run/php/php{}-fpm.sock", version)),
            (OsFamily::Debian, Some(pool)) => {
                PathBuf::from(format!("/run/php/php{}-fpm-{}.sock", version, pool))
            }
            (OsFamily::RhelLike, pool) => PathBuf::from(format!(
                "/var/opt/remi/php{}/run/php-fpm/{}.sock",
                compact_version(version),
                pool.unwrap_or("www")
            )),
        }
    }

    /// Error log of PHP-FPM `version`.
    pub fn php_log_path(&self, version: &str) -> PathBuf {
        match self.os {
            OsFamily::Debian => PathBuf::from(format!("/var/log/php{}-fpm.log", version)),
            OsFamily::RhelLike => PathBuf::from(format!(
                "/var/opt/remi/php{}/log/php-fpm/error.log",
                compact_version(version)
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debian_nginx_paths() {
        let layout = Layout::new(OsFamily::Debian);
        assert_eq!(
            layout.site_config_path("example.com"),
            PathBuf::from("/etc/nginx/sites-available/example.com")
        );
        assert_eq!(
            layout.site_enabled_path("example.com"),
            PathBuf::from("/etc/nginx/sites-enabled/example.com")
        );
    }

    #[test]
    fn test_rhel_nginx_paths() {
        let layout = Layout::new(OsFamily::RhelLike);
        assert_eq!(
            layout.site_config_path("example.com"),
            PathBuf::from("/etc/nginx/conf.d/example.com.conf")
        );
        assert_eq!(
            layout.site_config_path("example.com"),
            layout.site_enabled_path("example.com")
        );
        assert_eq!(
            layout.site_disabled_path("example.com"),
            PathBuf::from("/etc/nginx/conf.d/example.com.conf.disabled")
        );
    }

    #[test]
    fn test_rebased_roots() {
        let layout = Layout::new(OsFamily::Debian)
            .with_nginx_root("/tmp/stage")
            .with_php_root("/tmp/php");
        assert_eq!(
            layout.nginx_enabled_dir(),
            PathBuf::from("/tmp/stage/etc/nginx/sites-enabled")
        );
        assert_eq!(
            layout.php_pool_dir("8.3"),
            PathBuf::from("/tmp/php/etc/php/8.3/fpm/pool.d")
        );
        // Runtime paths stay absolute
        assert_eq!(
            layout.php_socket_path("8.3", None),
            PathBuf::from("/run/php/php8.3-fpm.sock")
        );
    }

    #[test]
    fn test_php_paths() {
        let debian = Layout::new(OsFamily::Debian);
        assert_eq!(
            debian.php_socket_path("8.2", Some("shop")),
            PathBuf::from("/run/php/php8.2-fpm-shop.sock")
        );
        assert_eq!(debian.php_log_path("8.2"), PathBuf::from("/var/log/php8.2-fpm.log"));

        let rhel = Layout::new(OsFamily::RhelLike);
        assert_eq!(
            rhel.php_pool_dir("8.2"),
            PathBuf::from("/etc/opt/remi/php82/php-fpm.d")
        );
        assert_eq!(
            rhel.php_socket_path("8.2", None),
            PathBuf::from("/var/opt/remi/php82/run/php-fpm/www.sock")
        );
        assert_eq!(
            rhel.php_socket_path("8.2", Some("shop")),
            PathBuf::from("/var/opt/remi/php82/run/php-fpm/shop.sock")
        );
    }

    #[test]
    fn test_php_binaries_and_units() {
        assert_eq!(php_fpm_binary(OsFamily::Debian, "8.3"), "/usr/sbin/php-fpm8.3");
        assert_eq!(
            php_fpm_binary(OsFamily::RhelLike, "8.3"),
            "/opt/remi/php83/root/usr/sbin/php-fpm"
        );
        assert_eq!(php_fpm_unit(OsFamily::Debian, "8.3"), "php8.3-fpm");
        assert_eq!(php_fpm_unit(OsFamily::RhelLike, "8.3"), "php83-php-fpm");
    }
}
