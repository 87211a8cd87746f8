//! Redis service definition.

use crate::os::OsFamily;

use super::traits::ServiceDefinition;

/// Redis cache service.
pub struct RedisService;

impl ServiceDefinition for RedisService {
    fn key(&self) -> &str {
        "redis"
    }

    fn display_name(&self) -> &str {
        "Redis"
    }

    fn icon(&self) -> &'static str {
        "cache"
    }

    fn supports_reload(&self) -> bool {
        false
    }

    fn unit(&self, os: OsFamily) -> String {
        match os {
            OsFamily::Debian => "redis-server",
            OsFamily::RhelLike => "redis",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_service() {
        let service = RedisService;
        assert_eq!(service.key(), "redis");
        assert_eq!(service.display_name(), "Redis");
        assert!(!service.supports_reload());
        assert_eq!(service.unit(OsFamily::Debian), "redis-server");
        assert_eq!(service.unit(OsFamily::RhelLike), "redis");
    }
}
