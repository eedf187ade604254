//! Plugin system configuration.

use serde::{Deserialize, Serialize};

/// Plugin system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory containing module subdirectories with `manifest.json` files.
    #[serde(default = "default_modules_dir")]
    pub modules_dir: String,
    /// Whether to load modules automatically on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// Watch the modules directory and invalidate the loader cache on
    /// changes. Intended for development; keep off in production so the
    /// active set stays stable.
    #[serde(default)]
    pub hot_reload: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            modules_dir: default_modules_dir(),
            auto_load: true,
            hot_reload: false,
        }
    }
}

fn default_modules_dir() -> String {
    "./modules".to_string()
}

fn default_true() -> bool {
    true
}
