//! Firewalld firewall (RHEL-like hosts).
//!
//! Firewalld keeps runtime state and permanent configuration apart. Every
//! rule change is therefore applied twice: to the runtime first, so it takes
//! effect immediately, then with `--permanent`, so it survives a reload or
//! reboot. The permanent call decides the reported outcome.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::OrchestratorResult;
use crate::executor::{sanitize_output, CommandLine, CommandResult, CommandRunner};
use crate::lock::{LockRegistry, LockScope};
use crate::os::{FIREWALL_CMD_BIN, SYSTEMCTL_BIN};
use crate::result::OperationResult;
use crate::validation::{validate_port, validate_protocol};

use super::traits::{Firewall, FirewallKind, FirewallRule, FirewallStatus};

const UNIT: &str = "firewalld";

/// Build a rule list from `--list-ports` and `--list-services` output.
///
/// Ports come first, then services prefixed with `service: `, numbered in
/// that order starting at 1.
pub fn parse_firewalld_rules(ports: &str, services: &str) -> Vec<FirewallRule> {
    let ports = ports.split_whitespace().map(str::to_string);
    let services = services
        .split_whitespace()
        .map(|service| format!("service: {}", service));

    ports
        .chain(services)
        .enumerate()
        .map(|(index, rule)| FirewallRule {
            number: index + 1,
            rule,
        })
        .collect()
}

/// Firewalld-backed firewall.
pub struct FirewalldFirewall {
    runner: Arc<dyn CommandRunner>,
    locks: Arc<LockRegistry>,
}

impl FirewalldFirewall {
    pub fn new(runner: Arc<dyn CommandRunner>, locks: Arc<LockRegistry>) -> Self {
        Self { runner, locks }
    }

    fn firewall_cmd(&self) -> CommandLine {
        CommandLine::new(FIREWALL_CMD_BIN)
    }

    fn systemctl(&self, action: &str) -> CommandResult {
        self.runner
            .run(&CommandLine::new(SYSTEMCTL_BIN).args([action, UNIT]))
    }

    /// Runtime state change followed by the boot-persistence change.
    fn switch(&self, runtime: &str, boot: &str, done: &str) -> OperationResult {
        let _guard = self.locks.acquire(LockScope::Firewall);

        let runtime_result = self.systemctl(runtime);
        let boot_result = self.systemctl(boot);
        let success = runtime_result.success && boot_result.success;

        if success {
            info!(action = runtime, "Firewalld state changed");
        } else {
            warn!(
                action = runtime,
                runtime_ok = runtime_result.success,
                boot_ok = boot_result.success,
                "Firewalld state change failed"
            );
        }

        let join = |a: &str, b: &str| {
            [a.trim(), b.trim()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join("\n")
        };

        OperationResult {
            success,
            message: if success {
                format!("Firewall {}", done)
            } else {
                format!("Failed to {} firewall", boot)
            },
            output: join(&runtime_result.stdout, &boot_result.stdout),
            error: join(&runtime_result.stderr, &boot_result.stderr),
        }
    }

    /// Apply `flag=<port>/<protocol>` at runtime, then permanently.
    fn change_port(
        &self,
        flag: &str,
        port: &str,
        protocol: &str,
        (verb, done): (&str, &str),
    ) -> OrchestratorResult<OperationResult> {
        let port = validate_port(port)?;
        let protocol = validate_protocol(protocol)?;
        let rule = format!("{}/{}", port.firewalld_notation(), protocol);
        let argument = format!("{}={}", flag, rule);

        let _guard = self.locks.acquire(LockScope::Firewall);

        let runtime = self.runner.run(&self.firewall_cmd().arg(&argument));
        if !runtime.success {
            warn!(
                rule = %rule,
                stderr = %sanitize_output(&runtime.stderr, 5),
                "Runtime firewall change failed, applying permanent change anyway"
            );
        }

        let permanent = self
            .runner
            .run(&self.firewall_cmd().args(["--permanent", &argument]));
        if permanent.success {
            info!(rule = %rule, action = verb, "Firewall rule updated");
        } else {
            warn!(
                rule = %rule,
                stderr = %sanitize_output(&permanent.stderr, 5),
                "Permanent firewall change failed"
            );
        }

        Ok(OperationResult::from_command(
            &permanent,
            format!("Rule {}: {}", done, rule),
            format!("Failed to {} rule: {}", verb, rule),
        ))
    }
}

impl Firewall for FirewalldFirewall {
    fn get_type(&self) -> FirewallKind {
        FirewallKind::Firewalld
    }

    fn get_status(&self) -> FirewallStatus {
        let result = self.runner.run(&self.firewall_cmd().arg("--state"));
        let stdout = result.stdout.trim().to_string();
        let stderr = result.stderr.trim().to_string();

        let status = if !stdout.is_empty() {
            stdout.clone()
        } else if !stderr.is_empty() && !stderr.starts_with("Failed to spawn") {
            stderr.clone()
        } else {
            "unknown".to_string()
        };

        FirewallStatus {
            active: result.success && stdout.contains("running") && !stdout.contains("not running"),
            status,
            output: stdout,
            error: stderr,
        }
    }

    fn enable(&self) -> OperationResult {
        self.switch("start", "enable", "enabled")
    }

    fn disable(&self) -> OperationResult {
        self.switch("stop", "disable", "disabled")
    }

    fn add_rule(&self, port: &str, protocol: &str) -> OrchestratorResult<OperationResult> {
        self.change_port("--add-port", port, protocol, ("add", "added"))
    }

    fn delete_rule(&self, port: &str, protocol: &str) -> OrchestratorResult<OperationResult> {
        self.change_port("--remove-port", port, protocol, ("remove", "removed"))
    }

    fn reset(&self) -> OperationResult {
        // Reloading restores the permanent rule set; it does not wipe rules.
        let _guard = self.locks.acquire(LockScope::Firewall);
        let result = self
            .runner
            .run(&self.firewall_cmd().arg("--complete-reload"));
        OperationResult::from_command(
            &result,
            "Firewall reloaded from permanent configuration",
            "Failed to reload firewall",
        )
    }

    fn get_rules(&self) -> Vec<FirewallRule> {
        let ports = self.runner.run(&self.firewall_cmd().arg("--list-ports"));
        let services = self.runner.run(&self.firewall_cmd().arg("--list-services"));

        if !ports.success && !services.success {
            warn!(stderr = %sanitize_output(&ports.stderr, 5), "Failed to list firewalld rules");
            return Vec::new();
        }

        let ports = if ports.success { ports.stdout } else { String::new() };
        let services = if services.success {
            services.stdout
        } else {
            String::new()
        };
        parse_firewalld_rules(&ports, &services)
    }
}
