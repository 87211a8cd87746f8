//! Cron service definition.

use crate::os::OsFamily;

use super::traits::ServiceDefinition;

/// The cron daemon.
pub struct CronService;

impl ServiceDefinition for CronService {
    fn key(&self) -> &str {
        "cron"
    }

    fn display_name(&self) -> &str {
        "Cron"
    }

    fn icon(&self) -> &'static str {
        "clock"
    }

    // Debian's cron unit has no reload action.
    fn supports_reload(&self) -> bool {
        false
    }

    fn unit(&self, os: OsFamily) -> String {
        match os {
            OsFamily::Debian => "cron",
            OsFamily::RhelLike => "crond",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cron_units() {
        assert_eq!(CronService.unit(OsFamily::Debian), "cron");
        assert_eq!(CronService.unit(OsFamily::RhelLike), "crond");
        assert!(!CronService.supports_reload());
    }
}
