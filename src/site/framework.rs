//! Framework hints that shape the generated location blocks.

use serde::{Deserialize, Serialize};

/// Application style of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// Plain files, no PHP handler.
    Static,
    /// Plain PHP scripts.
    #[default]
    Php,
    Laravel,
    Symfony,
    WordPress,
}

impl Framework {
    pub fn uses_php(self) -> bool {
        !matches!(self, Framework::Static)
    }

    /// `try_files` arguments of the root location.
    pub fn try_files(self) -> &'static str {
        match self {
            Framework::Static | Framework::Php => "$uri $uri/ =404",
            Framework::Laravel => "$uri $uri/ /index.php?$query_string",
            Framework::Symfony => "$uri /index.php$is_args$args",
            Framework::WordPress => "$uri $uri/ /index.php?$args",
        }
    }

    /// `index` directive value.
    pub fn index(self) -> &'static str {
        match self {
            Framework::Static => "index.html index.htm",
            _ => "index.php index.html",
        }
    }
}
