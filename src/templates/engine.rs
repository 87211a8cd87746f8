//! Tera template engine wrapper.
//!
//! Provides template loading, rendering, and overrides.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tera::{Context, Tera};
use tracing::{debug, info};

use crate::error::OrchestratorError;

/// Name of the nginx site template.
pub const NGINX_SITE_TEMPLATE: &str = "nginx/site.conf.tera";

/// Name of the PHP-FPM pool template.
pub const PHP_POOL_TEMPLATE: &str = "php-fpm/pool.conf.tera";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        NGINX_SITE_TEMPLATE,
        include_str!("../../templates/nginx/site.conf.tera"),
    ),
    (
        PHP_POOL_TEMPLATE,
        include_str!("../../templates/php-fpm/pool.conf.tera"),
    ),
];

/// Template engine for rendering configuration files.
///
/// Rendering is a pure function of the template and the context, so the
/// same input always yields byte-identical output.
#[derive(Clone)]
pub struct TemplateEngine {
    tera: Arc<Tera>,
}

impl TemplateEngine {
    fn builtin_tera() -> Result<Tera, OrchestratorError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())
            .map_err(|e| OrchestratorError::Template {
                message: format!("Failed to load built-in templates: {}", e),
            })?;
        Ok(tera)
    }

    /// Engine with only the built-in templates.
    pub fn builtin() -> Result<Self, OrchestratorError> {
        Ok(Self {
            tera: Arc::new(Self::builtin_tera()?),
        })
    }

    /// Engine whose templates from `template_dir` replace built-ins of the
    /// same name.
    ///
    /// Templates are loaded recursively from the directory with `.tera`
    /// extension.
    pub fn with_overrides(template_dir: &Path) -> Result<Self, OrchestratorError> {
        let pattern = template_dir.join("**/*.tera");
        let pattern_str = pattern.to_string_lossy();

        debug!(pattern = %pattern_str, "Loading template overrides");

        let mut tera = Tera::new(&pattern_str).map_err(|e| OrchestratorError::Template {
            message: format!(
                "Failed to load templates from '{}': {}",
                template_dir.display(),
                e
            ),
        })?;
        tera.autoescape_on(vec![]);

        let overrides = tera.get_template_names().count();

        // Built-ins only fill the names the directory did not provide.
        tera.extend(&Self::builtin_tera()?)
            .map_err(|e| OrchestratorError::Template {
                message: format!("Failed to merge built-in templates: {}", e),
            })?;

        info!(
            directory = %template_dir.display(),
            overrides = overrides,
            "Template engine initialized"
        );

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Render a template with a serializable context.
    pub fn render<C: Serialize>(
        &self,
        template_name: &str,
        context: &C,
    ) -> Result<String, OrchestratorError> {
        let tera_context = Context::from_serialize(context).map_err(|e| {
            OrchestratorError::Template {
                message: format!("Invalid template context: {}", e),
            }
        })?;

        self.tera
            .render(template_name, &tera_context)
            .map_err(|e| OrchestratorError::Template {
                message: format!("Failed to render template '{}': {}", template_name, e),
            })
    }

    /// Check if a template exists.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}
