//! Health monitor.
//!
//! Status queries run through a [`DeadlineRunner`]; a query that misses its
//! deadline yields an "unknown" status and is not retried.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::executor::{CommandRunner, DeadlineRunner};
use crate::lock::LockRegistry;
use crate::os::OsFamily;
use crate::services::{ServiceManager, ServiceStatus, SystemdServiceManager};
use crate::validation::PhpVersions;

/// Status of every installed catalog service at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub taken_at: DateTime<Utc>,
    pub services: Vec<ServiceStatus>,
}

impl HealthSnapshot {
    /// Keys of services that are installed but not running.
    pub fn down(&self) -> Vec<&str> {
        self.services
            .iter()
            .filter(|s| !s.running)
            .map(|s| s.key.as_str())
            .collect()
    }
}

pub struct HealthMonitor {
    services: SystemdServiceManager,
}

impl HealthMonitor {
    pub fn new(
        os: OsFamily,
        runner: Arc<dyn CommandRunner>,
        locks: Arc<LockRegistry>,
        command_timeout: Duration,
    ) -> Self {
        let bounded: Arc<dyn CommandRunner> =
            Arc::new(DeadlineRunner::new(runner, command_timeout));
        Self {
            services: SystemdServiceManager::new(os, bounded, locks),
        }
    }

    /// Watch one PHP-FPM unit per version in `versions`.
    pub fn with_php_versions(mut self, versions: &PhpVersions) -> Self {
        self.services = self.services.with_php_versions(versions);
        self
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let services = self
            .services
            .get_available_services()
            .into_iter()
            .filter_map(|descriptor| match self.services.get_service_status(&descriptor.key) {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!(service = %descriptor.key, error = %e, "Status query rejected");
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!(count = services.len(), "Health snapshot taken");
        HealthSnapshot {
            taken_at: Utc::now(),
            services,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{CommandResult, ScriptedRunner};

    fn installed(runner: &ScriptedRunner, unit: &str) {
        let file = format!("{}.service", unit);
        runner.respond(
            "systemctl",
            &["list-unit-files", "--no-legend", "--no-pager", &file],
            CommandResult::success(format!("{} enabled enabled\n", file)),
        );
    }

    #[test]
    fn test_snapshot_of_installed_services() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond("systemctl", &["list-unit-files"], CommandResult::success(""));
        installed(&runner, "nginx");
        installed(&runner, "redis-server");
        runner.respond("systemctl", &["is-active", "nginx"], CommandResult::success("active\n"));
        runner.respond(
            "systemctl",
            &["is-active", "redis-server"],
            CommandResult {
                stdout: "failed\n".to_string(),
                ..CommandResult::failure("")
            },
        );

        let monitor = HealthMonitor::new(
            OsFamily::Debian,
            runner,
            Arc::new(LockRegistry::new()),
            Duration::from_secs(5),
        );
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.services.len(), 2);
        assert_eq!(snapshot.down(), vec!["redis"]);
    }

    #[test]
    fn test_deadline_gives_unknown_status() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond("systemctl", &["list-unit-files"], CommandResult::success(""));
        installed(&runner, "nginx");
        runner.respond_after(
            "systemctl",
            &["is-active", "nginx"],
            Duration::from_millis(500),
            CommandResult::success("active\n"),
        );

        let monitor = HealthMonitor::new(
            OsFamily::Debian,
            runner.clone(),
            Arc::new(LockRegistry::new()),
            Duration::from_millis(50),
        );
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.services.len(), 1);
        assert_eq!(snapshot.services[0].status, "unknown");
        assert!(!snapshot.services[0].running);
        // Expired queries are not retried.
        assert_eq!(
            runner
                .calls()
                .iter()
                .filter(|c| c.args.first().map(String::as_str) == Some("is-active"))
                .count(),
            1
        );
    }
}
