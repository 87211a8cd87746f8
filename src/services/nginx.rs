//! Nginx service definition.

use crate::os::OsFamily;

use super::traits::ServiceDefinition;

/// Nginx web server.
pub struct NginxService;

impl ServiceDefinition for NginxService {
    fn key(&self) -> &str {
        "nginx"
    }

    fn display_name(&self) -> &str {
        "Nginx Web Server"
    }

    fn icon(&self) -> &'static str {
        "server"
    }

    fn unit(&self, _os: OsFamily) -> String {
        "nginx".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nginx_service() {
        let service = NginxService;
        assert_eq!(service.key(), "nginx");
        assert!(service.supports_reload());
        assert_eq!(service.unit(OsFamily::Debian), "nginx");
        assert_eq!(service.unit(OsFamily::RhelLike), "nginx");
    }
}
