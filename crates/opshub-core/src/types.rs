//! Navigation and routing types shared between the loader and the shell.

use serde::{Deserialize, Serialize};

use crate::manifest::PluginManifest;

/// A navigation entry contributed by a module to the shell sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavItem {
    /// Stable identifier; by convention the owning module's name.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Link target.
    pub href: String,
    /// Optional icon token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Optional sort order (lower first).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl NavItem {
    /// Derives the standard single nav entry for a module from its manifest.
    pub fn from_manifest(manifest: &PluginManifest) -> Self {
        Self {
            id: manifest.name.clone(),
            label: manifest.display_name.clone(),
            href: manifest.route.clone(),
            icon: Some(manifest.icon.clone()),
            order: manifest.order,
        }
    }
}

/// A route contributed by a module.
///
/// The shell resolves `component` to an actual page; the core only carries
/// the token across the server/client boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRoute {
    /// URL path.
    pub path: String,
    /// Component token resolved by the rendering shell.
    pub component: String,
}
