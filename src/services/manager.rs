//! systemd-backed service manager.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::executor::{sanitize_output, CommandLine, CommandRunner};
use crate::lock::LockRegistry;
use crate::os::{OsFamily, PS_BIN, SYSTEMCTL_BIN};
use crate::result::OperationResult;
use crate::validation::PhpVersions;

use super::registry::ServiceRegistry;
use super::status::{
    parse_active_state, parse_enabled_state, parse_main_pid, parse_process_stats, ServiceStatus,
};
use super::traits::{ServiceDefinition, ServiceDescriptor, ServiceManager};

/// Controls catalog services through `systemctl`.
pub struct SystemdServiceManager {
    os: OsFamily,
    runner: Arc<dyn CommandRunner>,
    registry: ServiceRegistry,
    locks: Arc<LockRegistry>,
}

impl SystemdServiceManager {
    pub fn new(os: OsFamily, runner: Arc<dyn CommandRunner>, locks: Arc<LockRegistry>) -> Self {
        Self {
            os,
            runner,
            registry: ServiceRegistry::default(),
            locks,
        }
    }

    /// Manage one PHP-FPM entry per version in `versions` instead of the
    /// built-in list.
    pub fn with_php_versions(mut self, versions: &PhpVersions) -> Self {
        self.registry = ServiceRegistry::new(versions);
        self
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    fn systemctl(&self) -> CommandLine {
        CommandLine::new(SYSTEMCTL_BIN)
    }

    fn is_installed(&self, service: &dyn ServiceDefinition) -> bool {
        let unit = format!("{}.service", service.unit(self.os));
        let result = self.runner.run(
            &self
                .systemctl()
                .args(["list-unit-files", "--no-legend", "--no-pager", unit.as_str()]),
        );
        result.success && !result.stdout.trim().is_empty()
    }

    fn control(&self, key: &str, action: &str, done: &str) -> OrchestratorResult<OperationResult> {
        let service = self.registry.require(key)?;
        if action == "reload" && !service.supports_reload() {
            return Err(OrchestratorError::Unsupported {
                operation: "reload".to_string(),
                target: key.to_string(),
            });
        }

        let unit = service.unit(self.os);
        let _guard = self.locks.acquire(service.lock_scope());
        let result = self.runner.run(&self.systemctl().args([action, unit.as_str()]));

        if result.success {
            info!(service = %key, unit = %unit, action, "Service action completed");
        } else {
            warn!(
                service = %key,
                unit = %unit,
                action,
                stderr = %sanitize_output(&result.stderr, 5),
                "Service action failed"
            );
        }

        Ok(OperationResult::from_command(
            &result,
            format!("{} {}", service.display_name(), done),
            format!("Failed to {} {}", action, service.display_name()),
        ))
    }
}

impl ServiceManager for SystemdServiceManager {
    fn get_supported_services(&self) -> Vec<ServiceDescriptor> {
        self.registry.iter().map(|s| s.descriptor()).collect()
    }

    fn get_available_services(&self) -> Vec<ServiceDescriptor> {
        self.registry
            .iter()
            .filter(|s| self.is_installed(s.as_ref()))
            .map(|s| s.descriptor())
            .collect()
    }

    fn get_service_status(&self, key: &str) -> OrchestratorResult<ServiceStatus> {
        let service = self.registry.require(key)?;
        let unit = service.unit(self.os);
        let mut status = ServiceStatus::unknown(key, &unit);

        let active = self.runner.run(&self.systemctl().args(["is-active", unit.as_str()]));
        if active.timed_out {
            return Ok(status);
        }
        status.status = parse_active_state(&active);
        status.running = status.status == "active";

        let enabled = self
            .runner
            .run(&self.systemctl().args(["is-enabled", unit.as_str()]));
        status.enabled = parse_enabled_state(&enabled);

        if !status.running {
            return Ok(status);
        }

        let show = self.runner.run(&self.systemctl().args([
            "show",
            unit.as_str(),
            "--property=MainPID",
            "--value",
        ]));
        status.pid = if show.success {
            parse_main_pid(&show.stdout)
        } else {
            None
        };

        if let Some(pid) = status.pid {
            let ps = self.runner.run(&CommandLine::new(PS_BIN).args([
                "-p",
                &pid.to_string(),
                "-o",
                "%cpu=,%mem=,etimes=",
            ]));
            if let Some(stats) = ps.success.then(|| parse_process_stats(&ps.stdout)).flatten() {
                status.cpu_percent = Some(stats.cpu_percent);
                status.memory_percent = Some(stats.memory_percent);
                status.uptime_seconds = Some(stats.elapsed_seconds);
                status.up_since = Some(stats.started_at(Utc::now()));
            }
        }

        debug!(
            service = %key,
            status = %status.status,
            enabled = status.enabled,
            pid = ?status.pid,
            "Service status retrieved"
        );
        Ok(status)
    }

    fn start_service(&self, key: &str) -> OrchestratorResult<OperationResult> {
        self.control(key, "start", "started")
    }

    fn stop_service(&self, key: &str) -> OrchestratorResult<OperationResult> {
        self.control(key, "stop", "stopped")
    }

    fn restart_service(&self, key: &str) -> OrchestratorResult<OperationResult> {
        self.control(key, "restart", "restarted")
    }

    fn reload_service(&self, key: &str) -> OrchestratorResult<OperationResult> {
        self.control(key, "reload", "reloaded")
    }
}
