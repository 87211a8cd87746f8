//! Generic service management.
//!
//! Contains the static service catalog and the systemd manager.
//!
//! ## Adding a New Service
//!
//! 1. Create a new file in this directory (e.g., `newservice.rs`)
//! 2. Implement the `ServiceDefinition` trait
//! 3. Register the service in `ServiceRegistry::new()`

mod cron;
mod firewall;
mod manager;
mod memcached;
mod mysql;
mod nginx;
mod php_fpm;
mod postgresql;
mod redis;
mod registry;
mod status;
mod supervisor;
mod traits;

pub use cron::CronService;
pub use firewall::FirewallService;
pub use manager::SystemdServiceManager;
pub use memcached::MemcachedService;
pub use mysql::{MariadbService, MysqlService};
pub use nginx::NginxService;
pub use php_fpm::PhpFpmService;
pub use postgresql::PostgresqlService;
pub use redis::RedisService;
pub use registry::ServiceRegistry;
pub use status::{parse_process_stats, ProcessStats, ServiceStatus};
pub use supervisor::SupervisorService;
pub use traits::{ServiceDefinition, ServiceDescriptor, ServiceManager};
