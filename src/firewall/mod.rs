//! Host firewall management.
//!
//! Two variants behind one [`Firewall`] contract:
//!
//! - [`UfwFirewall`] on Debian-like hosts
//! - [`FirewalldFirewall`] on RHEL-like hosts

mod firewalld;
mod traits;
mod ufw;

pub use firewalld::{parse_firewalld_rules, FirewalldFirewall};
pub use traits::{Firewall, FirewallKind, FirewallRule, FirewallStatus, DEFAULT_PROTOCOL};
pub use ufw::{parse_ufw_numbered, parse_ufw_status, UfwFirewall};
