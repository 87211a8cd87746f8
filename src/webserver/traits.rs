//! Web server service contract.

use std::path::PathBuf;

use crate::error::OrchestratorResult;
use crate::os::OsFamily;
use crate::result::OperationResult;
use crate::site::Site;

/// Site configuration lifecycle for one web server installation.
///
/// Mutating methods hold the site's lock for their whole duration, so two
/// callers working on the same site are serialized while different sites
/// proceed in parallel.
pub trait WebServer: Send + Sync {
    fn get_os_family(&self) -> OsFamily;

    /// Render the site's config. Pure and deterministic; no I/O.
    fn generate_config(&self, site: &Site) -> OrchestratorResult<String>;

    /// Write the generated config to the OS-convention location.
    fn write_config(&self, site: &Site) -> OrchestratorResult<OperationResult>;

    /// Remove the site's config and any activation link.
    fn delete_config(&self, site: &Site) -> OrchestratorResult<OperationResult>;

    fn enable_site(&self, site: &Site) -> OrchestratorResult<OperationResult>;

    fn disable_site(&self, site: &Site) -> OrchestratorResult<OperationResult>;

    /// Whether the web server currently loads the site.
    fn is_enabled(&self, site: &Site) -> bool;

    /// Syntax-check the complete configuration.
    fn test_config(&self) -> OperationResult;

    fn reload(&self) -> OperationResult;

    /// Write, enable, test, and reload only if the test passes.
    ///
    /// A failed test rolls the config file back and leaves the previous
    /// activation state untouched; reload is never attempted on a config
    /// that did not pass the test.
    fn deploy(&self, site: &Site) -> OrchestratorResult<OperationResult>;

    /// Disable and delete the site, then test and reload.
    fn remove(&self, site: &Site) -> OrchestratorResult<OperationResult>;

    /// Socket the site's PHP handler talks to.
    fn get_runtime_socket_path(&self, php_version: &str, pool_name: &str, custom_pool: bool)
        -> PathBuf;
}
