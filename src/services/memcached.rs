//! Memcached service definition.

use crate::os::OsFamily;

use super::traits::ServiceDefinition;

/// Memcached cache service.
pub struct MemcachedService;

impl ServiceDefinition for MemcachedService {
    fn key(&self) -> &str {
        "memcached"
    }

    fn display_name(&self) -> &str {
        "Memcached"
    }

    fn icon(&self) -> &'static str {
        "cache"
    }

    fn supports_reload(&self) -> bool {
        false
    }

    fn unit(&self, _os: OsFamily) -> String {
        "memcached".to_string()
    }
}
