//! Lumo Orchestrator Library
//!
//! OS-abstracted server configuration: firewall rules, nginx sites, PHP-FPM
//! pools and systemd services on Debian-like and RHEL-like hosts. Every
//! change is made by running native tools through a [`CommandRunner`] and is
//! reported as an [`OperationResult`].
//!
//! [`ServiceFactory`] is the entry point: it detects the OS family once and
//! hands out the matching implementations.
//!
//! [`CommandRunner`]: executor::CommandRunner
//! [`OperationResult`]: result::OperationResult
//! [`ServiceFactory`]: factory::ServiceFactory

pub mod config;
pub mod error;
pub mod executor;
pub mod factory;
pub mod files;
pub mod firewall;
pub mod health;
pub mod lock;
pub mod os;
pub mod php;
pub mod result;
pub mod services;
pub mod site;
pub mod templates;
pub mod validation;
pub mod webserver;
