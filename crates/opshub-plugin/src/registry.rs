//! Module registry — the source of truth for the currently active modules.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::traits::LoadedPlugin;

/// Registry of active modules, keyed by manifest name.
///
/// Dependency satisfaction is checked against the union of the current
/// discovery batch and the already-registered set, so a dependency can be
/// satisfied by a sibling loaded in the same pass regardless of directory
/// enumeration order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    /// Module name → module instance.
    modules: RwLock<HashMap<String, Arc<LoadedPlugin>>>,
}

impl PluginRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module.
    ///
    /// Returns `false` (with a warning) when a module with the same name is
    /// already present — first registration wins — or when any declared
    /// dependency is absent from both `available_ids` (the full discovery
    /// batch) and the registry. Registration is all-or-nothing.
    pub async fn register(
        &self,
        module: Arc<LoadedPlugin>,
        available_ids: &HashSet<String>,
    ) -> bool {
        let name = module.name().to_string();
        let mut modules = self.modules.write().await;

        if modules.contains_key(&name) {
            warn!(module = %name, "Module already registered, keeping the first");
            return false;
        }

        let missing: Vec<&String> = module
            .manifest()
            .dependencies
            .iter()
            .filter(|dep| !available_ids.contains(*dep) && !modules.contains_key(*dep))
            .collect();

        if !missing.is_empty() {
            warn!(
                module = %name,
                missing = ?missing,
                "Module skipped: unsatisfied dependencies"
            );
            return false;
        }

        info!(
            module = %name,
            version = %module.manifest().version,
            "Module registered"
        );
        modules.insert(name, module);
        true
    }

    /// Removes a module by name. Absence is logged, not an error.
    pub async fn unregister(&self, name: &str) {
        let mut modules = self.modules.write().await;
        if modules.remove(name).is_none() {
            warn!(module = %name, "No module to unregister");
            return;
        }
        info!(module = %name, "Module unregistered");
    }

    /// Looks up a module by name.
    pub async fn get(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        self.modules.read().await.get(name).cloned()
    }

    /// Returns a snapshot of all registered modules.
    pub async fn get_all(&self) -> Vec<Arc<LoadedPlugin>> {
        self.modules.read().await.values().cloned().collect()
    }

    /// Returns a snapshot of modules whose manifest is enabled.
    pub async fn get_enabled(&self) -> Vec<Arc<LoadedPlugin>> {
        self.modules
            .read()
            .await
            .values()
            .filter(|m| m.manifest().enabled)
            .cloned()
            .collect()
    }

    /// Checks whether a module is registered.
    pub async fn contains(&self, name: &str) -> bool {
        self.modules.read().await.contains_key(name)
    }

    /// Returns the number of registered modules.
    pub async fn count(&self) -> usize {
        self.modules.read().await.len()
    }
}
