//! Operating system family detection and per-family conventions.
//!
//! Everything that differs between Debian-like and RHEL-like hosts (paths,
//! service accounts, unit names) is a pure function of [`OsFamily`], so the
//! family is resolved once and injected everywhere else.

mod conventions;
mod detect;
mod family;

pub use conventions::{
    php_fpm_binary, php_fpm_unit, Layout, FIREWALL_CMD_BIN, NGINX_BIN, PS_BIN, SYSTEMCTL_BIN,
    UFW_BIN,
};
pub use detect::{detect_os_family, os_release_is_rhel_like, OsDetector};
pub use family::OsFamily;
