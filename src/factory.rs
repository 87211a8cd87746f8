//! Service factory.
//!
//! Resolves the OS family once and hands out the matching service
//! implementations. Every service shares one command runner and one lock
//! registry, and each is built at most once per factory.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::info;

use crate::config::Settings;
use crate::error::OrchestratorResult;
use crate::executor::{CommandRunner, PrivilegeWrapper, SystemRunner};
use crate::firewall::{Firewall, FirewalldFirewall, UfwFirewall};
use crate::health::HealthMonitor;
use crate::lock::LockRegistry;
use crate::os::{Layout, OsDetector, OsFamily};
use crate::php::{PhpFpm, PhpRuntime};
use crate::services::{ServiceManager, SystemdServiceManager};
use crate::templates::TemplateEngine;
use crate::validation::PhpVersions;
use crate::webserver::{NginxServer, WebServer};

const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Context object owning the per-host service instances.
pub struct ServiceFactory {
    layout: Layout,
    runner: Arc<dyn CommandRunner>,
    templates: TemplateEngine,
    locks: Arc<LockRegistry>,
    health_timeout: Duration,
    firewall: OnceLock<Arc<dyn Firewall>>,
    web_server: OnceLock<Arc<dyn WebServer>>,
    php_runtime: OnceLock<Arc<dyn PhpRuntime>>,
    service_manager: OnceLock<Arc<dyn ServiceManager>>,
}

impl ServiceFactory {
    /// Build services for `layout.os()` on top of `runner`.
    pub fn new(layout: Layout, runner: Arc<dyn CommandRunner>, templates: TemplateEngine) -> Self {
        Self {
            layout,
            runner,
            templates,
            locks: Arc::new(LockRegistry::new()),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            firewall: OnceLock::new(),
            web_server: OnceLock::new(),
            php_runtime: OnceLock::new(),
            service_manager: OnceLock::new(),
        }
    }

    /// Factory with the default layout and built-in templates.
    pub fn with_runner(os: OsFamily, runner: Arc<dyn CommandRunner>) -> OrchestratorResult<Self> {
        Ok(Self::new(Layout::new(os), runner, TemplateEngine::builtin()?))
    }

    /// Factory for this host, as described by `settings`.
    pub fn from_settings(settings: &Settings) -> OrchestratorResult<Self> {
        let os = OsDetector::from_config(&settings.os).detect();

        let mut layout =
            Layout::new(os).with_php_versions(PhpVersions::from_config(&settings.whitelists));
        if let Some(root) = &settings.paths.nginx_root {
            layout = layout.with_nginx_root(root);
        }
        if let Some(root) = &settings.paths.php_root {
            layout = layout.with_php_root(root);
        }

        let templates = match &settings.paths.templates_dir {
            Some(dir) => TemplateEngine::with_overrides(dir)?,
            None => TemplateEngine::builtin()?,
        };

        let privilege = PrivilegeWrapper::from_config(&settings.privilege);
        info!(
            os = %os,
            privileged = !privilege.is_empty(),
            "Service factory initialized"
        );

        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(privilege));
        Ok(Self::new(layout, runner, templates)
            .with_health_timeout(Duration::from_secs(settings.health.command_timeout_seconds)))
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn os_family(&self) -> OsFamily {
        self.layout.os()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn locks(&self) -> &Arc<LockRegistry> {
        &self.locks
    }

    /// UFW on Debian, firewalld on RHEL.
    pub fn firewall(&self) -> Arc<dyn Firewall> {
        Arc::clone(self.firewall.get_or_init(|| match self.os_family() {
            OsFamily::Debian => Arc::new(UfwFirewall::new(
                Arc::clone(&self.runner),
                Arc::clone(&self.locks),
            )),
            OsFamily::RhelLike => Arc::new(FirewalldFirewall::new(
                Arc::clone(&self.runner),
                Arc::clone(&self.locks),
            )),
        }))
    }

    pub fn web_server(&self) -> Arc<dyn WebServer> {
        Arc::clone(self.web_server.get_or_init(|| {
            Arc::new(NginxServer::new(
                self.layout.clone(),
                Arc::clone(&self.runner),
                self.templates.clone(),
                Arc::clone(&self.locks),
            ))
        }))
    }

    pub fn php_runtime(&self) -> Arc<dyn PhpRuntime> {
        Arc::clone(self.php_runtime.get_or_init(|| {
            Arc::new(PhpFpm::new(
                self.layout.clone(),
                Arc::clone(&self.runner),
                self.templates.clone(),
                Arc::clone(&self.locks),
            ))
        }))
    }

    pub fn service_manager(&self) -> Arc<dyn ServiceManager> {
        Arc::clone(self.service_manager.get_or_init(|| {
            Arc::new(
                SystemdServiceManager::new(
                    self.os_family(),
                    Arc::clone(&self.runner),
                    Arc::clone(&self.locks),
                )
                .with_php_versions(self.layout.php_versions()),
            )
        }))
    }

    /// A monitor whose status queries are bounded by the health timeout.
    pub fn health_monitor(&self) -> HealthMonitor {
        HealthMonitor::new(
            self.os_family(),
            Arc::clone(&self.runner),
            Arc::clone(&self.locks),
            self.health_timeout,
        )
        .with_php_versions(self.layout.php_versions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ScriptedRunner;
    use crate::firewall::FirewallKind;

    #[test]
    fn test_firewall_follows_os() {
        let runner = Arc::new(ScriptedRunner::new());
        let debian = ServiceFactory::with_runner(OsFamily::Debian, runner.clone()).unwrap();
        assert_eq!(debian.firewall().get_type(), FirewallKind::Ufw);

        let rhel = ServiceFactory::with_runner(OsFamily::RhelLike, runner).unwrap();
        assert_eq!(rhel.firewall().get_type(), FirewallKind::Firewalld);
        assert_eq!(rhel.web_server().get_os_family(), OsFamily::RhelLike);
        assert_eq!(rhel.php_runtime().get_os_family(), OsFamily::RhelLike);
    }

    #[test]
    fn test_services_are_memoized() {
        let runner = Arc::new(ScriptedRunner::new());
        let factory = ServiceFactory::with_runner(OsFamily::Debian, runner).unwrap();
        assert!(Arc::ptr_eq(&factory.firewall(), &factory.firewall()));
        assert!(Arc::ptr_eq(&factory.web_server(), &factory.web_server()));
        assert!(Arc::ptr_eq(&factory.php_runtime(), &factory.php_runtime()));
        assert!(Arc::ptr_eq(
            &factory.service_manager(),
            &factory.service_manager()
        ));
    }

    #[test]
    fn test_from_settings_honours_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::from_toml(&format!(
            "[os]\nfamily = \"rhel\"\n[paths]\nnginx_root = \"{}\"\n",
            dir.path().display()
        ))
        .unwrap();
        let factory = ServiceFactory::from_settings(&settings).unwrap();
        assert_eq!(factory.os_family(), OsFamily::RhelLike);
        assert!(factory
            .layout()
            .site_config_path("example.com")
            .starts_with(dir.path()));
    }

    #[test]
    fn test_configured_php_versions_reach_every_service() {
        let settings =
            Settings::from_toml("[whitelists]\nadditional_php_versions = [\"8.5\"]\n").unwrap();
        let factory = ServiceFactory::from_settings(&settings).unwrap();
        assert!(factory.layout().php_versions().contains("8.5"));
        assert!(factory
            .service_manager()
            .get_supported_services()
            .iter()
            .any(|s| s.key == "php8.5-fpm"));
        assert!(factory.php_runtime().get_log_path("8.5").is_ok());

        let plain = ServiceFactory::with_runner(OsFamily::Debian, Arc::new(ScriptedRunner::new()))
            .unwrap();
        assert!(plain.php_runtime().get_log_path("8.5").is_err());
    }
}
