//! PHP runtime pool management (PHP-FPM).

mod fpm;
mod pool;
mod traits;

pub use fpm::PhpFpm;
pub use pool::{PhpPoolContext, PoolTuning};
pub use traits::{php_service_key, PhpRuntime};
