//! Web server (nginx) site management.
//!
//! One [`WebServer`] contract; the OS family decides how a site is
//! activated (a `sites-enabled` symlink on Debian, direct inclusion from
//! `conf.d` on RHEL).

mod activation;
mod nginx;
mod traits;

pub use activation::Activation;
pub use nginx::{NginxServer, NginxSiteContext};
pub use traits::WebServer;
