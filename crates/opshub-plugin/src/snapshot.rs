//! The serializable projection handed from server-side loading to the
//! client-rendered shell.

use serde::{Deserialize, Serialize};

use opshub_core::manifest::PluginManifest;
use opshub_core::permissions::has_all_permissions;
use opshub_core::types::NavItem;

/// Everything the client shell needs to know about active modules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginClientSnapshot {
    /// Manifests of every active module.
    pub manifests: Vec<PluginManifest>,
    /// Flattened navigation entries from every active module.
    #[serde(rename = "navItems")]
    pub nav_items: Vec<NavItem>,
}

impl PluginClientSnapshot {
    /// Projects the snapshot down to what a grant set may see.
    ///
    /// A module survives when all of its manifest permissions are granted;
    /// nav items survive when their owning module (by id convention) does.
    pub fn filter_by_permissions(&self, granted: &[String]) -> Self {
        let manifests: Vec<PluginManifest> = self
            .manifests
            .iter()
            .filter(|m| has_all_permissions(granted, &m.permissions))
            .cloned()
            .collect();

        let allowed: std::collections::HashSet<&str> =
            manifests.iter().map(|m| m.name.as_str()).collect();

        let nav_items = self
            .nav_items
            .iter()
            .filter(|item| allowed.contains(item.id.as_str()))
            .cloned()
            .collect();

        Self {
            manifests,
            nav_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(name: &str, permissions: &[&str]) -> PluginManifest {
        PluginManifest::from_value(&json!({
            "name": name,
            "displayName": name,
            "description": "",
            "icon": "box",
            "route": format!("/{name}"),
            "version": "1.0.0",
            "enabled": true,
            "dependencies": [],
            "permissions": permissions
        }))
        .unwrap()
    }

    #[test]
    fn permission_filter_drops_unauthorized_modules() {
        let ops = manifest("ops", &["ops:view"]);
        let finance = manifest("finance", &["finance:view"]);
        let snapshot = PluginClientSnapshot {
            nav_items: vec![
                NavItem::from_manifest(&ops),
                NavItem::from_manifest(&finance),
            ],
            manifests: vec![ops, finance],
        };

        let filtered = snapshot.filter_by_permissions(&["ops:view".to_string()]);
        assert_eq!(filtered.manifests.len(), 1);
        assert_eq!(filtered.manifests[0].name, "ops");
        assert_eq!(filtered.nav_items.len(), 1);
        assert_eq!(filtered.nav_items[0].id, "ops");
    }

    #[test]
    fn snapshot_serializes_with_client_field_names() {
        let ops = manifest("ops", &[]);
        let snapshot = PluginClientSnapshot {
            nav_items: vec![NavItem::from_manifest(&ops)],
            manifests: vec![ops],
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("navItems").is_some());
        assert_eq!(value["manifests"][0]["displayName"], json!("ops"));
    }
}
