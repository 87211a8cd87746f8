//! PHP-FPM pools on either OS family.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{OrchestratorError, OrchestratorResult, ValidationErrorKind};
use crate::executor::{sanitize_output, CommandLine, CommandResult, CommandRunner};
use crate::files::{write_atomic, FileSnapshot};
use crate::lock::{LockRegistry, LockScope};
use crate::os::{php_fpm_binary, php_fpm_unit, Layout, OsFamily, SYSTEMCTL_BIN};
use crate::result::OperationResult;
use crate::site::Site;
use crate::templates::{TemplateEngine, PHP_POOL_TEMPLATE};
use crate::validation::validate_pool_name;

use super::pool::{PhpPoolContext, PoolTuning};
use super::traits::{php_service_key, PhpRuntime};

/// PHP-FPM runtime.
pub struct PhpFpm {
    layout: Layout,
    runner: Arc<dyn CommandRunner>,
    templates: TemplateEngine,
    locks: Arc<LockRegistry>,
    tuning: PoolTuning,
}

impl PhpFpm {
    pub fn new(
        layout: Layout,
        runner: Arc<dyn CommandRunner>,
        templates: TemplateEngine,
        locks: Arc<LockRegistry>,
    ) -> Self {
        Self {
            layout,
            runner,
            templates,
            locks,
            tuning: PoolTuning::default(),
        }
    }

    pub fn with_tuning(mut self, tuning: PoolTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The validated dedicated pool of `site`.
    fn site_pool<'a>(&self, site: &'a Site) -> OrchestratorResult<&'a str> {
        let pool = site.pool().ok_or_else(|| OrchestratorError::Validation {
            kind: ValidationErrorKind::MissingParameter {
                param: "pool_name".to_string(),
            },
        })?;
        validate_pool_name(pool)
    }

    fn pool_lock(site: &Site, pool: &str) -> LockScope {
        LockScope::PhpPool(site.php_version.clone(), pool.to_string())
    }

    fn run_test(&self, version: &str, pool_config: Option<&Path>) -> CommandResult {
        let mut command = CommandLine::new(&php_fpm_binary(self.layout.os(), version)).arg("-t");
        if let Some(path) = pool_config {
            command = command.arg("-y").arg(path.display().to_string());
        }
        self.runner.run(&command)
    }

    fn systemctl(&self, action: &str, version: &str) -> CommandResult {
        let unit = php_fpm_unit(self.layout.os(), version);
        let _guard = self
            .locks
            .acquire(LockScope::Service(php_service_key(version)));
        self.runner
            .run(&CommandLine::new(SYSTEMCTL_BIN).args([action, unit.as_str()]))
    }

    fn restore(snapshot: &FileSnapshot, path: &Path) {
        if let Err(e) = snapshot.restore() {
            error!(path = %path.display(), error = %e, "Failed to restore previous pool config");
        }
    }

    fn write_unlocked(&self, path: &Path, content: &str) -> io::Result<()> {
        write_atomic(path, content.as_bytes())
    }
}

/// `php-fpm -t` reports on stderr in both outcomes.
fn test_outcome(result: &CommandResult, version: &str) -> OperationResult {
    let report = result.stderr.trim().to_string();
    OperationResult {
        success: result.success,
        message: if result.success {
            format!("PHP {} FPM configuration test passed", version)
        } else {
            format!("PHP {} FPM configuration test failed", version)
        },
        output: report.clone(),
        error: if result.success { String::new() } else { report },
    }
}

impl PhpRuntime for PhpFpm {
    fn get_os_family(&self) -> OsFamily {
        self.layout.os()
    }

    fn get_pool_directory_path(&self, version: &str) -> OrchestratorResult<PathBuf> {
        self.layout.php_versions().validate(version)?;
        Ok(self.layout.php_pool_dir(version))
    }

    fn get_socket_path(
        &self,
        version: &str,
        pool_name: Option<&str>,
    ) -> OrchestratorResult<PathBuf> {
        self.layout.php_versions().validate(version)?;
        if let Some(pool) = pool_name {
            validate_pool_name(pool)?;
        }
        Ok(self.layout.php_socket_path(version, pool_name))
    }

    fn get_log_path(&self, version: &str) -> OrchestratorResult<PathBuf> {
        self.layout.php_versions().validate(version)?;
        Ok(self.layout.php_log_path(version))
    }

    fn generate_pool_config(&self, site: &Site) -> OrchestratorResult<String> {
        site.validate(self.layout.php_versions())?;
        let pool = self.site_pool(site)?;
        let context = PhpPoolContext::new(site, pool, &self.layout, &self.tuning);
        self.templates.render(PHP_POOL_TEMPLATE, &context)
    }

    fn write_pool_config(&self, site: &Site) -> OrchestratorResult<OperationResult> {
        let content = self.generate_pool_config(site)?;
        let pool = self.site_pool(site)?;
        let path = self.layout.php_pool_path(&site.php_version, pool);
        let _guard = self.locks.acquire(Self::pool_lock(site, pool));

        Ok(match self.write_unlocked(&path, &content) {
            Ok(()) => {
                info!(
                    pool,
                    version = %site.php_version,
                    path = %path.display(),
                    "Wrote pool config"
                );
                OperationResult::ok(format!("Pool {} written", pool))
                    .with_output(path.display().to_string())
            }
            Err(e) => {
                OperationResult::failed(format!("Failed to write pool {}", pool), e.to_string())
            }
        })
    }

    fn delete_pool_config(&self, site: &Site) -> OrchestratorResult<OperationResult> {
        self.layout.php_versions().validate(&site.php_version)?;
        let pool = self.site_pool(site)?;
        let path = self.layout.php_pool_path(&site.php_version, pool);
        let _guard = self.locks.acquire(Self::pool_lock(site, pool));

        Ok(match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(pool, version = %site.php_version, "Deleted pool config");
                OperationResult::ok(format!("Pool {} deleted", pool))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                OperationResult::ok(format!("Pool {} not present", pool))
            }
            Err(e) => {
                OperationResult::failed(format!("Failed to delete pool {}", pool), e.to_string())
            }
        })
    }

    fn test_config(
        &self,
        version: &str,
        pool_config: Option<&Path>,
    ) -> OrchestratorResult<OperationResult> {
        self.layout.php_versions().validate(version)?;
        Ok(test_outcome(&self.run_test(version, pool_config), version))
    }

    fn restart(&self, version: &str) -> OrchestratorResult<OperationResult> {
        self.layout.php_versions().validate(version)?;
        let result = self.systemctl("restart", version);
        Ok(OperationResult::from_command(
            &result,
            format!("PHP {} FPM restarted", version),
            format!("Failed to restart PHP {} FPM", version),
        ))
    }

    fn reload(&self, version: &str) -> OrchestratorResult<OperationResult> {
        self.layout.php_versions().validate(version)?;
        let result = self.systemctl("reload", version);
        Ok(OperationResult::from_command(
            &result,
            format!("PHP {} FPM reloaded", version),
            format!("Failed to reload PHP {} FPM", version),
        ))
    }

    fn deploy_pool(&self, site: &Site) -> OrchestratorResult<OperationResult> {
        let content = self.generate_pool_config(site)?;
        let pool = self.site_pool(site)?;
        let version = site.php_version.as_str();
        let path = self.layout.php_pool_path(version, pool);
        let _guard = self.locks.acquire(Self::pool_lock(site, pool));

        let snapshot = match FileSnapshot::capture(&path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return Ok(OperationResult::failed(
                    format!("Failed to read existing pool {}", pool),
                    e.to_string(),
                ))
            }
        };

        if !snapshot.matches(content.as_bytes()) {
            if let Err(e) = self.write_unlocked(&path, &content) {
                return Ok(OperationResult::failed(
                    format!("Failed to write pool {}", pool),
                    e.to_string(),
                ));
            }
        }

        let test = self.run_test(version, Some(&path));
        if !test.success {
            warn!(
                pool,
                version,
                stderr = %sanitize_output(&test.stderr, 5),
                "PHP-FPM configuration test failed, rolling back"
            );
            Self::restore(&snapshot, &path);
            let mut outcome = test_outcome(&test, version);
            outcome.message = format!(
                "Pool {} failed the configuration test; PHP-FPM not reloaded",
                pool
            );
            return Ok(outcome);
        }

        let reload = self.systemctl("reload", version);
        if reload.success {
            info!(pool, version, "Pool deployed");
        } else {
            warn!(
                pool,
                version,
                stderr = %sanitize_output(&reload.stderr, 5),
                "PHP-FPM reload failed"
            );
        }
        Ok(OperationResult::from_command(
            &reload,
            format!("Pool {} deployed", pool),
            format!("Pool {} is valid but PHP {} FPM reload failed", pool, version),
        ))
    }
}
