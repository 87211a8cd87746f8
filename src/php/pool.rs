//! Pool template context.

use serde::{Deserialize, Serialize};

use crate::os::Layout;
use crate::site::Site;

/// Process manager tuning of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolTuning {
    pub pm: String,
    pub pm_max_children: u32,
    pub pm_start_servers: u32,
    pub pm_min_spare_servers: u32,
    pub pm_max_spare_servers: u32,
    pub pm_max_requests: u32,
    pub request_timeout: u32,
    pub memory_limit: String,
    pub upload_max_filesize: String,
}

impl Default for PoolTuning {
    fn default() -> Self {
        Self {
            pm: "dynamic".to_string(),
            pm_max_children: 5,
            pm_start_servers: 2,
            pm_min_spare_servers: 1,
            pm_max_spare_servers: 3,
            pm_max_requests: 500,
            request_timeout: 300,
            memory_limit: "256M".to_string(),
            upload_max_filesize: "64M".to_string(),
        }
    }
}

/// Values handed to the pool template.
#[derive(Debug, Clone, Serialize)]
pub struct PhpPoolContext {
    pub domain: String,
    pub os_family: String,
    pub pool_name: String,
    pub user: String,
    pub group: String,
    pub listen: String,
    pub document_root: String,
    pub error_log: String,
    #[serde(flatten)]
    pub tuning: PoolTuning,
}

impl PhpPoolContext {
    /// `pool` must already be validated.
    pub fn new(site: &Site, pool: &str, layout: &Layout, tuning: &PoolTuning) -> Self {
        let os = layout.os();
        Self {
            domain: site.domain.clone(),
            os_family: os.to_string(),
            pool_name: pool.to_string(),
            user: os.web_user().to_string(),
            group: os.web_group().to_string(),
            listen: layout
                .php_socket_path(&site.php_version, Some(pool))
                .display()
                .to_string(),
            document_root: site.document_root.clone(),
            error_log: layout.php_log_path(&site.php_version).display().to_string(),
            tuning: tuning.clone(),
        }
    }
}
