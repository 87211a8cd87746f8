//! PHP runtime service contract.

use std::path::{Path, PathBuf};

use crate::error::OrchestratorResult;
use crate::os::OsFamily;
use crate::result::OperationResult;
use crate::site::Site;

/// Catalog key of the PHP-FPM service for `version`, e.g. `php8.3-fpm`.
pub fn php_service_key(version: &str) -> String {
    format!("php{}-fpm", version)
}

/// Per-version PHP-FPM pool management.
///
/// Pool config writes hold the `(version, pool)` lock; restart and reload
/// hold the lock of the version's service key.
pub trait PhpRuntime: Send + Sync {
    fn get_os_family(&self) -> OsFamily;

    fn get_pool_directory_path(&self, version: &str) -> OrchestratorResult<PathBuf>;

    /// Socket of `pool_name`, or of the distribution's default pool.
    fn get_socket_path(&self, version: &str, pool_name: Option<&str>)
        -> OrchestratorResult<PathBuf>;

    fn get_log_path(&self, version: &str) -> OrchestratorResult<PathBuf>;

    /// Render the site's pool config. The run-as user and group always come
    /// from the OS family.
    fn generate_pool_config(&self, site: &Site) -> OrchestratorResult<String>;

    fn write_pool_config(&self, site: &Site) -> OrchestratorResult<OperationResult>;

    fn delete_pool_config(&self, site: &Site) -> OrchestratorResult<OperationResult>;

    /// Test the whole installation, or only `pool_config` when given.
    fn test_config(&self, version: &str, pool_config: Option<&Path>)
        -> OrchestratorResult<OperationResult>;

    fn restart(&self, version: &str) -> OrchestratorResult<OperationResult>;

    fn reload(&self, version: &str) -> OrchestratorResult<OperationResult>;

    /// Write, test and reload; a failed test restores the previous pool file.
    fn deploy_pool(&self, site: &Site) -> OrchestratorResult<OperationResult>;
}
