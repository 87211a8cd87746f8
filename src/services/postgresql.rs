//! PostgreSQL service definition.

use crate::os::OsFamily;

use super::traits::ServiceDefinition;

/// PostgreSQL database server.
pub struct PostgresqlService;

impl ServiceDefinition for PostgresqlService {
    fn key(&self) -> &str {
        "postgresql"
    }

    fn display_name(&self) -> &str {
        "PostgreSQL"
    }

    fn icon(&self) -> &'static str {
        "database"
    }

    fn unit(&self, _os: OsFamily) -> String {
        "postgresql".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgresql_service() {
        let service = PostgresqlService;
        assert_eq!(service.key(), "postgresql");
        assert_eq!(service.display_name(), "PostgreSQL");
        assert_eq!(service.unit(OsFamily::Debian), "postgresql");
    }
}
