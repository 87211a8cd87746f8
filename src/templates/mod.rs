//! Configuration templates.
//!
//! The nginx site and PHP-FPM pool templates ship inside the binary; a
//! directory of `.tera` files can override them by name.

mod engine;

pub use engine::{TemplateEngine, NGINX_SITE_TEMPLATE, PHP_POOL_TEMPLATE};
