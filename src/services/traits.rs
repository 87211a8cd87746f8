//! Service definition and manager traits.

use serde::Serialize;

use crate::error::OrchestratorResult;
use crate::lock::LockScope;
use crate::os::OsFamily;
use crate::result::OperationResult;

use super::status::ServiceStatus;

/// Catalog entry of a manageable service, independent of live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub key: String,
    pub display_name: String,
    pub icon: String,
    pub supports_reload: bool,
}

/// Describes one manageable service.
///
/// # Example
///
/// ```ignore
/// pub struct RedisService;
///
/// impl ServiceDefinition for RedisService {
///     fn key(&self) -> &str { "redis" }
///     fn display_name(&self) -> &str { "Redis" }
///     fn icon(&self) -> &'static str { "database" }
///     fn unit(&self, os: OsFamily) -> String { ... }
/// }
/// ```
pub trait ServiceDefinition: Send + Sync {
    /// Catalog key (e.g. "redis", "php8.3-fpm"). Unique in the catalog.
    fn key(&self) -> &str;

    fn display_name(&self) -> &str;

    fn icon(&self) -> &'static str;

    /// Whether the unit can reload without a restart.
    fn supports_reload(&self) -> bool {
        true
    }

    /// systemd unit name on `os`, without the `.service` suffix.
    fn unit(&self, os: OsFamily) -> String;

    /// Lock held while the unit is started, stopped or reloaded.
    fn lock_scope(&self) -> LockScope {
        LockScope::Service(self.key().to_string())
    }

    fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor {
            key: self.key().to_string(),
            display_name: self.display_name().to_string(),
            icon: self.icon().to_string(),
            supports_reload: self.supports_reload(),
        }
    }
}

/// Lifecycle control and status of catalog services.
///
/// Every method taking a key fails with an unknown-service validation
/// error when the key is not in the catalog.
pub trait ServiceManager: Send + Sync {
    /// The full static catalog.
    fn get_supported_services(&self) -> Vec<ServiceDescriptor>;

    /// Catalog entries whose unit is installed on this host.
    fn get_available_services(&self) -> Vec<ServiceDescriptor>;

    fn get_service_status(&self, key: &str) -> OrchestratorResult<ServiceStatus>;

    fn start_service(&self, key: &str) -> OrchestratorResult<OperationResult>;

    fn stop_service(&self, key: &str) -> OrchestratorResult<OperationResult>;

    fn restart_service(&self, key: &str) -> OrchestratorResult<OperationResult>;

    /// Reload in place. Services that cannot reload get
    /// [`OrchestratorError::Unsupported`](crate::error::OrchestratorError::Unsupported);
    /// this never falls back to a restart.
    fn reload_service(&self, key: &str) -> OrchestratorResult<OperationResult>;
}
