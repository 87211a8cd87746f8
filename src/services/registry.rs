//! Service registry.
//!
//! Static catalog of every service the orchestrator can manage, in display
//! order.

use std::sync::Arc;

use tracing::info;

use crate::error::{OrchestratorError, OrchestratorResult, ValidationErrorKind};
use crate::validation::PhpVersions;

use super::cron::CronService;
use super::firewall::FirewallService;
use super::memcached::MemcachedService;
use super::mysql::{MariadbService, MysqlService};
use super::nginx::NginxService;
use super::php_fpm::PhpFpmService;
use super::postgresql::PostgresqlService;
use super::redis::RedisService;
use super::supervisor::SupervisorService;
use super::traits::ServiceDefinition;

/// Registry of all service definitions.
pub struct ServiceRegistry {
    services: Vec<Arc<dyn ServiceDefinition>>,
}

impl ServiceRegistry {
    /// Create a registry with all built-in services plus one PHP-FPM entry
    /// per version in `php_versions`.
    pub fn new(php_versions: &PhpVersions) -> Self {
        let mut registry = Self {
            services: Vec::new(),
        };

        registry.register(Arc::new(NginxService));

        for version in php_versions.iter() {
            registry.register(Arc::new(PhpFpmService::new(version)));
        }

        registry.register(Arc::new(MysqlService));
        registry.register(Arc::new(MariadbService));
        registry.register(Arc::new(PostgresqlService));
        registry.register(Arc::new(RedisService));
        registry.register(Arc::new(MemcachedService));
        registry.register(Arc::new(SupervisorService));
        registry.register(Arc::new(CronService));
        registry.register(Arc::new(FirewallService));

        info!(
            count = registry.services.len(),
            "Service registry initialized"
        );

        registry
    }

    fn register(&mut self, service: Arc<dyn ServiceDefinition>) {
        if self.get(service.key()).is_none() {
            self.services.push(service);
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn ServiceDefinition>> {
        self.services.iter().find(|s| s.key() == key).cloned()
    }

    /// Like [`get`](Self::get), but an unknown key is a validation error.
    pub fn require(&self, key: &str) -> OrchestratorResult<Arc<dyn ServiceDefinition>> {
        self.get(key).ok_or_else(|| OrchestratorError::Validation {
            kind: ValidationErrorKind::UnknownService {
                service: key.to_string(),
            },
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ServiceDefinition>> {
        self.services.iter()
    }

    /// Catalog keys in display order.
    pub fn list(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.key()).collect()
    }

    pub fn count(&self) -> usize {
        self.services.len()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new(&PhpVersions::builtin())
    }
}
