//! UFW firewall (Debian-like hosts).
//!
//! UFW persists rules on its own, so every change is a single call.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{info, warn};

use crate::error::OrchestratorResult;
use crate::executor::{sanitize_output, split_lines, CommandLine, CommandRunner};
use crate::lock::{LockRegistry, LockScope};
use crate::os::UFW_BIN;
use crate::result::OperationResult;
use crate::validation::{validate_port, validate_protocol};

use super::traits::{Firewall, FirewallKind, FirewallRule, FirewallStatus};

fn numbered_rule_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\[\s*(\d+)\]\s+(.+)$").expect("static regex is valid"))
}

/// Parse `ufw status numbered` output.
///
/// Lines that do not look like `[ N] <rule>` are skipped.
pub fn parse_ufw_numbered(output: &str) -> Vec<FirewallRule> {
    split_lines(output)
        .iter()
        .filter_map(|line| {
            let captures = numbered_rule_pattern().captures(line)?;
            let number = captures.get(1)?.as_str().parse().ok()?;
            let rule = captures.get(2)?.as_str().trim().to_string();
            Some(FirewallRule { number, rule })
        })
        .collect()
}

/// Extract the state word from `ufw status` output (`Status: active`).
pub fn parse_ufw_status(output: &str) -> Option<String> {
    split_lines(output).into_iter().find_map(|line| {
        line.strip_prefix("Status:")
            .map(|state| state.trim().to_lowercase())
    })
}

/// UFW-backed firewall.
pub struct UfwFirewall {
    runner: Arc<dyn CommandRunner>,
    locks: Arc<LockRegistry>,
}

impl UfwFirewall {
    pub fn new(runner: Arc<dyn CommandRunner>, locks: Arc<LockRegistry>) -> Self {
        Self { runner, locks }
    }

    fn ufw(&self) -> CommandLine {
        CommandLine::new(UFW_BIN)
    }

    fn change(&self, command: CommandLine, success: String, failure: String) -> OperationResult {
        let _guard = self.locks.acquire(LockScope::Firewall);
        let result = self.runner.run(&command);
        if result.success {
            info!(command = %command, "Firewall updated");
        } else {
            warn!(
                command = %command,
                stderr = %sanitize_output(&result.stderr, 5),
                "Firewall change failed"
            );
        }
        OperationResult::from_command(&result, success, failure)
    }
}

impl Firewall for UfwFirewall {
    fn get_type(&self) -> FirewallKind {
        FirewallKind::Ufw
    }

    fn get_status(&self) -> FirewallStatus {
        let result = self.runner.run(&self.ufw().arg("status"));
        let state = if result.success {
            parse_ufw_status(&result.stdout)
        } else {
            None
        };

        FirewallStatus {
            active: state.as_deref() == Some("active"),
            status: state.unwrap_or_else(|| "unknown".to_string()),
            output: result.stdout.trim().to_string(),
            error: result.stderr.trim().to_string(),
        }
    }

    fn enable(&self) -> OperationResult {
        self.change(
            self.ufw().args(["--force", "enable"]),
            "Firewall enabled".to_string(),
            "Failed to enable firewall".to_string(),
        )
    }

    fn disable(&self) -> OperationResult {
        self.change(
            self.ufw().arg("disable"),
            "Firewall disabled".to_string(),
            "Failed to disable firewall".to_string(),
        )
    }

    fn add_rule(&self, port: &str, protocol: &str) -> OrchestratorResult<OperationResult> {
        let port = validate_port(port)?;
        let protocol = validate_protocol(protocol)?;
        let rule = format!("{}/{}", port.ufw_notation(), protocol);

        Ok(self.change(
            self.ufw().args(["allow", &rule]),
            format!("Rule added: allow {}", rule),
            format!("Failed to add rule: allow {}", rule),
        ))
    }

    fn delete_rule(&self, port: &str, protocol: &str) -> OrchestratorResult<OperationResult> {
        let port = validate_port(port)?;
        let protocol = validate_protocol(protocol)?;
        let rule = format!("{}/{}", port.ufw_notation(), protocol);

        Ok(self.change(
            self.ufw().args(["delete", "allow", &rule]),
            format!("Rule deleted: allow {}", rule),
            format!("Failed to delete rule: allow {}", rule),
        ))
    }

    fn reset(&self) -> OperationResult {
        self.change(
            self.ufw().args(["--force", "reset"]),
            "Firewall reset to defaults".to_string(),
            "Failed to reset firewall".to_string(),
        )
    }

    fn get_rules(&self) -> Vec<FirewallRule> {
        let result = self.runner.run(&self.ufw().args(["status", "numbered"]));
        if !result.success {
            warn!(stderr = %sanitize_output(&result.stderr, 5), "Failed to list ufw rules");
            return Vec::new();
        }
        parse_ufw_numbered(&result.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{CommandResult, ScriptedRunner};

    const NUMBERED: &str = "Status: active

     To                         Action      From
     --                         ------      ----
[ 1] 22/tcp                     ALLOW IN    Anywhere
[ 2] 80/tcp                     ALLOW IN    Anywhere
[10] 443/tcp (v6)               ALLOW IN    Anywhere (v6)
";

    fn firewall() -> (Arc<ScriptedRunner>, UfwFirewall) {
        let runner = Arc::new(ScriptedRunner::new());
        let firewall = UfwFirewall::new(runner.clone(), Arc::new(LockRegistry::new()));
        (runner, firewall)
    }

    #[test]
    fn test_parse_single_rule() {
        let rules = parse_ufw_numbered("[ 1] 22/tcp ALLOW Anywhere");
        assert_eq!(
            rules,
            vec![FirewallRule {
                number: 1,
                rule: "22/tcp ALLOW Anywhere".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_numbered_listing() {
        let rules = parse_ufw_numbered(NUMBERED);
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1].number, 2);
        assert!(rules[1].rule.starts_with("80/tcp"));
        assert_eq!(rules[2].number, 10);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_ufw_numbered("Status: inactive").is_empty());
        assert!(parse_ufw_numbered("").is_empty());
        assert!(parse_ufw_numbered("[x] nonsense").is_empty());
    }

    #[test]
    fn test_status_active() {
        let (runner, firewall) = firewall();
        runner.respond("ufw", &["status"], CommandResult::success("Status: active\n"));
        let status = firewall.get_status();
        assert!(status.active);
        assert_eq!(status.status, "active");
    }

    #[test]
    fn test_status_tool_missing() {
        let (runner, firewall) = firewall();
        runner.respond("ufw", &["status"], CommandResult::failure("ufw: not found"));
        let status = firewall.get_status();
        assert!(!status.active);
        assert_eq!(status.error, "ufw: not found");
    }

    #[test]
    fn test_enable_uses_force_flag() {
        let (runner, firewall) = firewall();
        assert!(firewall.enable().success);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, UFW_BIN);
        assert_eq!(calls[0].args, vec!["--force", "enable"]);
    }

    #[test]
    fn test_add_and_delete_rule_single_call() {
        let (runner, firewall) = firewall();
        assert!(firewall.add_rule("8080", "tcp").unwrap().success);
        assert!(firewall.delete_rule("6000-6010", "udp").unwrap().success);

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, vec!["allow", "8080/tcp"]);
        assert_eq!(calls[1].args, vec!["delete", "allow", "6000:6010/udp"]);
    }

    #[test]
    fn test_invalid_input_is_hard_error() {
        let (runner, firewall) = firewall();
        assert!(firewall.add_rule("http", "tcp").is_err());
        assert!(firewall.add_rule("80", "icmp").is_err());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_failed_change_keeps_stderr() {
        let (runner, firewall) = firewall();
        runner.respond("ufw", &["allow"], CommandResult::failure("ERROR: You need to be root"));
        let result = firewall.allow_port("443").unwrap();
        assert!(!result.success);
        assert_eq!(result.error, "ERROR: You need to be root");
    }

    #[test]
    fn test_reset_is_hard_reset() {
        let (runner, firewall) = firewall();
        firewall.reset();
        assert!(runner.was_called("ufw", &["--force", "reset"]));
    }
}
