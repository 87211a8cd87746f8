//! nginx site management.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::OrchestratorResult;
use crate::executor::{sanitize_output, CommandLine, CommandResult, CommandRunner};
use crate::files::{write_atomic, FileSnapshot};
use crate::lock::{LockRegistry, LockScope};
use crate::os::{Layout, OsFamily, NGINX_BIN, SYSTEMCTL_BIN};
use crate::result::OperationResult;
use crate::site::Site;
use crate::templates::{TemplateEngine, NGINX_SITE_TEMPLATE};
use crate::validation::validate_domain;

use super::activation::{self, Activation};
use super::traits::WebServer;

/// Catalog key of the nginx service.
const NGINX_SERVICE_KEY: &str = "nginx";

/// Values handed to the nginx site template.
#[derive(Debug, Clone, Serialize)]
pub struct NginxSiteContext {
    pub domain: String,
    pub os_family: String,
    pub server_names: String,
    pub document_root: String,
    pub index: String,
    pub try_files: String,
    pub php_enabled: bool,
    pub php_socket: String,
    pub ssl_enabled: bool,
    pub ssl_certificate: String,
    pub ssl_certificate_key: String,
}

impl NginxSiteContext {
    pub fn for_site(site: &Site, layout: &Layout) -> Self {
        let mut server_names = vec![site.domain.as_str()];
        server_names.extend(site.aliases.iter().map(String::as_str));

        Self {
            domain: site.domain.clone(),
            os_family: layout.os().to_string(),
            server_names: server_names.join(" "),
            document_root: site.document_root.clone(),
            index: site.framework.index().to_string(),
            try_files: site.framework.try_files().to_string(),
            php_enabled: site.framework.uses_php(),
            php_socket: layout
                .php_socket_path(&site.php_version, site.pool())
                .display()
                .to_string(),
            ssl_enabled: site.ssl_enabled,
            ssl_certificate: site.certificate_path(),
            ssl_certificate_key: site.certificate_key_path(),
        }
    }
}

/// nginx on either OS family.
pub struct NginxServer {
    layout: Layout,
    runner: Arc<dyn CommandRunner>,
    templates: TemplateEngine,
    locks: Arc<LockRegistry>,
}

impl NginxServer {
    pub fn new(
        layout: Layout,
        runner: Arc<dyn CommandRunner>,
        templates: TemplateEngine,
        locks: Arc<LockRegistry>,
    ) -> Self {
        Self {
            layout,
            runner,
            templates,
            locks,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn run_test(&self) -> CommandResult {
        self.runner.run(&CommandLine::new(NGINX_BIN).arg("-t"))
    }

    /// Reload under the same lock the service manager uses for nginx.
    fn run_reload(&self) -> CommandResult {
        let _guard = self.locks.acquire(LockScope::Service(NGINX_SERVICE_KEY.to_string()));
        self.runner
            .run(&CommandLine::new(SYSTEMCTL_BIN).args(["reload", "nginx"]))
    }

    fn write_unlocked(&self, site: &Site, content: &str) -> io::Result<PathBuf> {
        let path = activation::config_target(&self.layout, &site.domain);
        write_atomic(&path, content.as_bytes())?;
        Ok(path)
    }

    /// Undo a deploy whose config did not pass the test.
    fn roll_back(&self, domain: &str, snapshot: &FileSnapshot, enabled: &Activation) {
        if let Err(e) = activation::revert(&self.layout, domain, enabled) {
            error!(domain, error = %e, "Failed to undo site activation");
        }
        if let Err(e) = snapshot.restore() {
            error!(domain, error = %e, "Failed to restore previous site config");
        }
    }

    fn deploy_locked(&self, site: &Site, content: &str) -> OperationResult {
        let domain = site.domain.as_str();
        let target = activation::config_target(&self.layout, domain);

        let snapshot = match FileSnapshot::capture(&target) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return OperationResult::failed(
                    format!("Failed to read existing config for {}", domain),
                    e.to_string(),
                )
            }
        };

        if snapshot.matches(content.as_bytes()) {
            info!(domain, "Site config unchanged");
        } else if let Err(e) = write_atomic(&target, content.as_bytes()) {
            return OperationResult::failed(
                format!("Failed to write config for {}", domain),
                e.to_string(),
            );
        }

        let enabled = match activation::enable(&self.layout, domain) {
            Ok(state) => state,
            Err(e) => {
                self.roll_back(domain, &snapshot, &Activation::Unchanged);
                return OperationResult::failed(
                    format!("Failed to enable site {}", domain),
                    e.to_string(),
                );
            }
        };

        let test = self.run_test();
        if !test.success {
            warn!(
                domain,
                stderr = %sanitize_output(&test.stderr, 5),
                "nginx configuration test failed, rolling back"
            );
            self.roll_back(domain, &snapshot, &enabled);
            return OperationResult::from_command(
                &test,
                "",
                format!("Configuration test failed for {}; nginx not reloaded", domain),
            );
        }

        let reload = self.run_reload();
        if reload.success {
            info!(domain, "Site deployed");
        } else {
            warn!(domain, stderr = %sanitize_output(&reload.stderr, 5), "nginx reload failed");
        }
        OperationResult::from_command(
            &reload,
            format!("Site {} deployed", domain),
            format!("Configuration for {} is valid but nginx reload failed", domain),
        )
    }
}

impl WebServer for NginxServer {
    fn get_os_family(&self) -> OsFamily {
        self.layout.os()
    }

    fn generate_config(&self, site: &Site) -> OrchestratorResult<String> {
        site.validate(self.layout.php_versions())?;
        let context = NginxSiteContext::for_site(site, &self.layout);
        self.templates.render(NGINX_SITE_TEMPLATE, &context)
    }

    fn write_config(&self, site: &Site) -> OrchestratorResult<OperationResult> {
        let content = self.generate_config(site)?;
        let _guard = self.locks.acquire(LockScope::Site(site.domain.clone()));

        Ok(match self.write_unlocked(site, &content) {
            Ok(path) => {
                info!(domain = %site.domain, path = %path.display(), "Wrote site config");
                OperationResult::ok(format!("Configuration written for {}", site.domain))
                    .with_output(path.display().to_string())
            }
            Err(e) => OperationResult::failed(
                format!("Failed to write config for {}", site.domain),
                e.to_string(),
            ),
        })
    }

    fn delete_config(&self, site: &Site) -> OrchestratorResult<OperationResult> {
        validate_domain(&site.domain)?;
        let _guard = self.locks.acquire(LockScope::Site(site.domain.clone()));

        Ok(match activation::remove_all(&self.layout, &site.domain) {
            Ok(true) => {
                info!(domain = %site.domain, "Deleted site config");
                OperationResult::ok(format!("Configuration deleted for {}", site.domain))
            }
            Ok(false) => {
                OperationResult::ok(format!("No configuration present for {}", site.domain))
            }
            Err(e) => OperationResult::failed(
                format!("Failed to delete config for {}", site.domain),
                e.to_string(),
            ),
        })
    }

    fn enable_site(&self, site: &Site) -> OrchestratorResult<OperationResult> {
        validate_domain(&site.domain)?;
        let _guard = self.locks.acquire(LockScope::Site(site.domain.clone()));

        Ok(match activation::enable(&self.layout, &site.domain) {
            Ok(Activation::Changed | Activation::Relinked(_)) => {
                info!(domain = %site.domain, "Site enabled");
                OperationResult::ok(format!("Site {} enabled", site.domain))
            }
            Ok(Activation::Unchanged) => {
                OperationResult::ok(format!("Site {} already enabled", site.domain))
            }
            Ok(Activation::MissingConfig) => OperationResult::failed(
                format!("Site {} has no configuration", site.domain),
                format!(
                    "Site configuration not found: {}",
                    self.layout.site_config_path(&site.domain).display()
                ),
            ),
            Err(e) => OperationResult::failed(
                format!("Failed to enable site {}", site.domain),
                e.to_string(),
            ),
        })
    }

    fn disable_site(&self, site: &Site) -> OrchestratorResult<OperationResult> {
        validate_domain(&site.domain)?;
        let _guard = self.locks.acquire(LockScope::Site(site.domain.clone()));

        Ok(match activation::disable(&self.layout, &site.domain) {
            Ok(Activation::Changed) => {
                info!(domain = %site.domain, "Site disabled");
                OperationResult::ok(format!("Site {} disabled", site.domain))
            }
            Ok(_) => OperationResult::ok(format!("Site {} already disabled", site.domain)),
            Err(e) => OperationResult::failed(
                format!("Failed to disable site {}", site.domain),
                e.to_string(),
            ),
        })
    }

    fn is_enabled(&self, site: &Site) -> bool {
        activation::is_enabled(&self.layout, &site.domain)
    }

    fn test_config(&self) -> OperationResult {
        let result = self.run_test();
        // nginx -t reports on stderr in both outcomes.
        OperationResult {
            success: result.success,
            message: if result.success {
                "nginx configuration test passed".to_string()
            } else {
                "nginx configuration test failed".to_string()
            },
            output: result.stderr.trim().to_string(),
            error: if result.success {
                String::new()
            } else {
                result.stderr.trim().to_string()
            },
        }
    }

    fn reload(&self) -> OperationResult {
        let result = self.run_reload();
        OperationResult::from_command(&result, "nginx reloaded", "Failed to reload nginx")
    }

    fn deploy(&self, site: &Site) -> OrchestratorResult<OperationResult> {
        let content = self.generate_config(site)?;
        let _guard = self.locks.acquire(LockScope::Site(site.domain.clone()));
        Ok(self.deploy_locked(site, &content))
    }

    fn remove(&self, site: &Site) -> OrchestratorResult<OperationResult> {
        validate_domain(&site.domain)?;
        let _guard = self.locks.acquire(LockScope::Site(site.domain.clone()));

        match activation::remove_all(&self.layout, &site.domain) {
            Ok(false) => {
                return Ok(OperationResult::ok(format!(
                    "No configuration present for {}",
                    site.domain
                )))
            }
            Ok(true) => {}
            Err(e) => {
                return Ok(OperationResult::failed(
                    format!("Failed to remove site {}", site.domain),
                    e.to_string(),
                ))
            }
        }

        let test = self.run_test();
        if !test.success {
            return Ok(OperationResult::from_command(
                &test,
                "",
                format!("Site {} removed but nginx configuration test failed", site.domain),
            ));
        }

        let reload = self.run_reload();
        Ok(OperationResult::from_command(
            &reload,
            format!("Site {} removed", site.domain),
            format!("Site {} removed but nginx reload failed", site.domain),
        ))
    }

    fn get_runtime_socket_path(
        &self,
        php_version: &str,
        pool_name: &str,
        custom_pool: bool,
    ) -> PathBuf {
        let pool = if custom_pool { Some(pool_name) } else { None };
        self.layout.php_socket_path(php_version, pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ScriptedRunner;
    use crate::site::Framework;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        runner: Arc<ScriptedRunner>,
        nginx: NginxServer,
    }

    fn fixture(os: OsFamily) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let layout = Layout::new(os).with_nginx_root(dir.path().join("nginx"));
        let nginx = NginxServer::new(
            layout,
            runner.clone(),
            TemplateEngine::builtin().unwrap(),
            Arc::new(LockRegistry::new()),
        );
        Fixture {
            _dir: dir,
            runner,
            nginx,
        }
    }

    fn site() -> Site {
        Site::new("example.com", "/var/www/example.com/public", "8.3")
    }

    #[test]
    fn test_generate_is_deterministic() {
        let f = fixture(OsFamily::Debian);
        let first = f.nginx.generate_config(&site()).unwrap();
        let second = f.nginx.generate_config(&site()).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("server_name example.com;"));
        assert!(first.contains("root /var/www/example.com/public;"));
        assert!(first.contains("fastcgi_pass unix:/run/php/php8.3-fpm.sock;"));
        assert!(!first.contains("ssl_certificate"));
    }

    #[test]
    fn test_generate_uses_custom_pool_socket_on_rhel() {
        let f = fixture(OsFamily::RhelLike);
        let config = f
            .nginx
            .generate_config(&site().with_pool("example").with_alias("www.example.com"))
            .unwrap();
        assert!(config.contains("server_name example.com www.example.com;"));
        assert!(config.contains("unix:/var/opt/remi/php83/run/php-fpm/example.sock;"));
    }

    #[test]
    fn test_generate_ssl_and_static() {
        let f = fixture(OsFamily::Debian);
        let config = f
            .nginx
            .generate_config(&site().with_ssl().with_framework(Framework::Static))
            .unwrap();
        assert!(config.contains("listen 443 ssl;"));
        assert!(config.contains("return 301 https://$host$request_uri;"));
        assert!(config
            .contains("ssl_certificate /etc/letsencrypt/live/example.com/fullchain.pem;"));
        assert!(!config.contains("fastcgi_pass"));
    }

    #[test]
    fn test_generate_rejects_invalid_site() {
        let f = fixture(OsFamily::Debian);
        let bad = Site::new("not a domain", "/var/www/x", "8.3");
        assert!(f.nginx.generate_config(&bad).is_err());
        let bad = Site::new("example.com", "/etc/passwd", "8.3");
        assert!(f.nginx.generate_config(&bad).is_err());
    }

    #[test]
    fn test_socket_path_variants() {
        let f = fixture(OsFamily::Debian);
        assert_eq!(
            f.nginx.get_runtime_socket_path("8.2", "shop", true),
            PathBuf::from("/run/php/php8.2-fpm-shop.sock")
        );
        assert_eq!(
            f.nginx.get_runtime_socket_path("8.2", "shop", false),
            PathBuf::from("/run/php/php8.2-fpm.sock")
        );
    }

    #[test]
    fn test_deploy_debian_writes_links_tests_reloads() {
        let f = fixture(OsFamily::Debian);
        let result = f.nginx.deploy(&site()).unwrap();
        assert!(result.success, "{:?}", result);

        let layout = f.nginx.layout();
        assert!(layout.site_config_path("example.com").is_file());
        assert!(f.nginx.is_enabled(&site()));

        let calls = f.runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, NGINX_BIN);
        assert_eq!(calls[0].args, vec!["-t"]);
        assert_eq!(calls[1].args, vec!["reload", "nginx"]);
    }

    #[test]
    fn test_deploy_is_idempotent() {
        let f = fixture(OsFamily::Debian);
        assert!(f.nginx.deploy(&site()).unwrap().success);
        let path = f.nginx.layout().site_config_path("example.com");
        let before = fs::read(&path).unwrap();

        assert!(f.nginx.deploy(&site()).unwrap().success);
        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(f.nginx.is_enabled(&site()));
    }

    #[test]
    fn test_failed_test_rolls_back_new_site() {
        let f = fixture(OsFamily::Debian);
        f.runner.respond(
            "nginx",
            &["-t"],
            CommandResult::failure("nginx: [emerg] unexpected \"}\""),
        );

        let result = f.nginx.deploy(&site()).unwrap();
        assert!(!result.success);
        assert!(result.error.contains("emerg"));
        assert!(!f.runner.was_called("systemctl", &["reload"]));
        assert!(!f.nginx.is_enabled(&site()));
        assert!(!f.nginx.layout().site_config_path("example.com").exists());
    }

    #[test]
    fn test_failed_test_keeps_previous_deploy() {
        let f = fixture(OsFamily::Debian);
        assert!(f.nginx.deploy(&site()).unwrap().success);
        let path = f.nginx.layout().site_config_path("example.com");
        let good = fs::read(&path).unwrap();
        f.runner.clear_calls();

        f.runner
            .respond("nginx", &["-t"], CommandResult::failure("test failed"));
        let changed = site().with_framework(Framework::Laravel);
        let result = f.nginx.deploy(&changed).unwrap();

        assert!(!result.success);
        assert!(!f.runner.was_called("systemctl", &["reload"]));
        assert!(f.nginx.is_enabled(&site()));
        assert_eq!(fs::read(&path).unwrap(), good);
    }

    fn link_relative(f: &Fixture) -> PathBuf {
        let layout = f.nginx.layout();
        let enabled = layout.site_enabled_path("example.com");
        fs::create_dir_all(layout.nginx_enabled_dir()).unwrap();
        std::os::unix::fs::symlink("../sites-available/example.com", &enabled).unwrap();
        enabled
    }

    #[test]
    fn test_failed_test_keeps_relative_link() {
        let f = fixture(OsFamily::Debian);
        assert!(f.nginx.write_config(&site()).unwrap().success);
        let enabled = link_relative(&f);

        f.runner
            .respond("nginx", &["-t"], CommandResult::failure("test failed"));
        let result = f
            .nginx
            .deploy(&site().with_framework(Framework::Laravel))
            .unwrap();

        assert!(!result.success);
        assert!(f.nginx.is_enabled(&site()));
        assert_eq!(
            fs::read_link(&enabled).unwrap(),
            PathBuf::from("../sites-available/example.com")
        );
    }

    #[test]
    fn test_redeploy_leaves_relative_link_alone() {
        let f = fixture(OsFamily::Debian);
        assert!(f.nginx.write_config(&site()).unwrap().success);
        let enabled = link_relative(&f);

        assert!(f.nginx.deploy(&site()).unwrap().success);
        assert_eq!(
            fs::read_link(&enabled).unwrap(),
            PathBuf::from("../sites-available/example.com")
        );
    }

    #[test]
    fn test_failed_test_restores_replaced_link() {
        let f = fixture(OsFamily::Debian);
        assert!(f.nginx.write_config(&site()).unwrap().success);
        let layout = f.nginx.layout();
        let enabled = layout.site_enabled_path("example.com");
        let other = layout.nginx_available_dir().join("example.com.old");
        fs::write(&other, "server {}\n").unwrap();
        fs::create_dir_all(layout.nginx_enabled_dir()).unwrap();
        std::os::unix::fs::symlink(&other, &enabled).unwrap();

        f.runner
            .respond("nginx", &["-t"], CommandResult::failure("test failed"));
        assert!(!f.nginx.deploy(&site()).unwrap().success);
        assert_eq!(fs::read_link(&enabled).unwrap(), other);
    }

    #[test]
    fn test_deploy_rhel_into_conf_d() {
        let f = fixture(OsFamily::RhelLike);
        assert!(f.nginx.deploy(&site()).unwrap().success);
        let layout = f.nginx.layout();
        assert!(layout.site_enabled_path("example.com").is_file());
        assert!(fs::read_to_string(layout.site_config_path("example.com"))
            .unwrap()
            .contains("(rhel)"));
    }

    #[test]
    fn test_deploy_rhel_disabled_site_gate_failure() {
        let f = fixture(OsFamily::RhelLike);
        assert!(f.nginx.deploy(&site()).unwrap().success);
        assert!(f.nginx.disable_site(&site()).unwrap().success);

        f.runner
            .respond("nginx", &["-t"], CommandResult::failure("bad"));
        assert!(!f.nginx.deploy(&site()).unwrap().success);

        let layout = f.nginx.layout();
        assert!(!f.nginx.is_enabled(&site()));
        assert!(layout.site_disabled_path("example.com").is_file());
    }

    #[test]
    fn test_enable_without_config_fails() {
        let f = fixture(OsFamily::Debian);
        let result = f.nginx.enable_site(&site()).unwrap();
        assert!(!result.success);
        assert!(result.error.contains("not found"));
    }

    #[test]
    fn test_write_enable_disable_delete() {
        let f = fixture(OsFamily::Debian);
        assert!(f.nginx.write_config(&site()).unwrap().success);
        assert!(!f.nginx.is_enabled(&site()));

        assert!(f.nginx.enable_site(&site()).unwrap().success);
        assert!(f.nginx.is_enabled(&site()));
        let again = f.nginx.enable_site(&site()).unwrap();
        assert!(again.message.contains("already"));

        assert!(f.nginx.disable_site(&site()).unwrap().success);
        assert!(!f.nginx.is_enabled(&site()));

        assert!(f.nginx.delete_config(&site()).unwrap().success);
        assert!(!f.nginx.layout().site_config_path("example.com").exists());
        assert!(f.runner.calls().is_empty());
    }

    #[test]
    fn test_remove_tests_and_reloads() {
        let f = fixture(OsFamily::Debian);
        assert!(f.nginx.deploy(&site()).unwrap().success);
        f.runner.clear_calls();

        let result = f.nginx.remove(&site()).unwrap();
        assert!(result.success);
        assert!(!f.nginx.is_enabled(&site()));
        assert_eq!(f.runner.calls().len(), 2);
    }

    #[test]
    fn test_test_config_reports_stderr() {
        let f = fixture(OsFamily::Debian);
        f.runner.respond(
            "nginx",
            &["-t"],
            CommandResult {
                success: true,
                exit_code: Some(0),
                stdout: String::new(),
                stderr: "nginx: configuration file /etc/nginx/nginx.conf test is successful\n"
                    .to_string(),
                timed_out: false,
            },
        );
        let result = f.nginx.test_config();
        assert!(result.success);
        assert!(result.output.contains("test is successful"));
    }
}
