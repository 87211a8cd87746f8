//! Firewall service contract.

use std::fmt;

use serde::Serialize;

use crate::error::OrchestratorResult;
use crate::result::OperationResult;

/// Protocol used when a caller does not name one.
pub const DEFAULT_PROTOCOL: &str = "tcp";

/// Which firewall tool backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FirewallKind {
    Ufw,
    Firewalld,
}

impl fmt::Display for FirewallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirewallKind::Ufw => f.write_str("ufw"),
            FirewallKind::Firewalld => f.write_str("firewalld"),
        }
    }
}

/// Snapshot of the firewall state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallStatus {
    pub active: bool,
    /// Tool vocabulary for the state (`active`, `inactive`, `running`, ...).
    pub status: String,
    pub output: String,
    pub error: String,
}

/// One rule as listed by the firewall tool.
///
/// `number` is a display ordinal assigned at listing time. It is not a
/// stable identifier: the same rule can get a different number on the next
/// [`Firewall::get_rules`] call if the rule set changed in between, so never
/// store it or use it to address a rule later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    pub number: usize,
    pub rule: String,
}

/// Common contract of all firewall variants.
///
/// Mutating methods serialize on the firewall lock. Ports and protocols are
/// validated first; malformed values are returned as `Err`, while tool
/// failures come back as an unsuccessful [`OperationResult`].
pub trait Firewall: Send + Sync {
    fn get_type(&self) -> FirewallKind;

    /// Never fails; an unavailable tool yields `active == false`.
    fn get_status(&self) -> FirewallStatus;

    fn enable(&self) -> OperationResult;

    fn disable(&self) -> OperationResult;

    /// Allow `port` (or range) for `protocol`.
    fn add_rule(&self, port: &str, protocol: &str) -> OrchestratorResult<OperationResult>;

    /// Remove the allow rule for `port` and `protocol`.
    fn delete_rule(&self, port: &str, protocol: &str) -> OrchestratorResult<OperationResult>;

    fn reset(&self) -> OperationResult;

    /// Current rules; empty when the listing cannot be read or parsed.
    fn get_rules(&self) -> Vec<FirewallRule>;

    /// [`add_rule`](Firewall::add_rule) with the default protocol.
    fn allow_port(&self, port: &str) -> OrchestratorResult<OperationResult> {
        self.add_rule(port, DEFAULT_PROTOCOL)
    }

    /// [`delete_rule`](Firewall::delete_rule) with the default protocol.
    fn remove_port(&self, port: &str) -> OrchestratorResult<OperationResult> {
        self.delete_rule(port, DEFAULT_PROTOCOL)
    }
}
