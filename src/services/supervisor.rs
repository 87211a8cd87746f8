//! Supervisor service definition.

use crate::os::OsFamily;

use super::traits::ServiceDefinition;

/// Supervisor process manager service.
pub struct SupervisorService;

impl ServiceDefinition for SupervisorService {
    fn key(&self) -> &str {
        "supervisor"
    }

    fn display_name(&self) -> &str {
        "Supervisor"
    }

    fn icon(&self) -> &'static str {
        "process"
    }

    fn unit(&self, os: OsFamily) -> String {
        match os {
            OsFamily::Debian => "supervisor",
            OsFamily::RhelLike => "supervisord",
        }
        .to_string()
    }
}
