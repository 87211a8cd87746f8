//! Firewall daemon service definition.

use crate::lock::LockScope;
use crate::os::OsFamily;

use super::traits::ServiceDefinition;

/// The host firewall daemon (ufw or firewalld).
pub struct FirewallService;

impl ServiceDefinition for FirewallService {
    fn key(&self) -> &str {
        "firewall"
    }

    fn display_name(&self) -> &str {
        "Firewall"
    }

    fn icon(&self) -> &'static str {
        "shield"
    }

    fn unit(&self, os: OsFamily) -> String {
        match os {
            OsFamily::Debian => "ufw",
            OsFamily::RhelLike => "firewalld",
        }
        .to_string()
    }

    /// Shared with rule changes, so a stop never lands between the runtime
    /// and permanent halves of a firewalld change.
    fn lock_scope(&self) -> LockScope {
        LockScope::Firewall
    }
}
