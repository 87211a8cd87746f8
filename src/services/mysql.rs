//! MySQL and MariaDB service definitions.

use crate::os::OsFamily;

use super::traits::ServiceDefinition;

/// MySQL database server.
pub struct MysqlService;

impl ServiceDefinition for MysqlService {
    fn key(&self) -> &str {
        "mysql"
    }

    fn display_name(&self) -> &str {
        "MySQL"
    }

    fn icon(&self) -> &'static str {
        "database"
    }

    // The mysqld unit defines no reload action.
    fn supports_reload(&self) -> bool {
        false
    }

    fn unit(&self, os: OsFamily) -> String {
        match os {
            OsFamily::Debian => "mysql",
            OsFamily::RhelLike => "mysqld",
        }
        .to_string()
    }
}

/// MariaDB database server.
pub struct MariadbService;

impl ServiceDefinition for MariadbService {
    fn key(&self) -> &str {
        "mariadb"
    }

    fn display_name(&self) -> &str {
        "MariaDB"
    }

    fn icon(&self) -> &'static str {
        "database"
    }

    fn unit(&self, _os: OsFamily) -> String {
        "mariadb".to_string()
    }
}
