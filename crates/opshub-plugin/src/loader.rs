//! Plugin loader — discovers, validates, registers, and activates modules.
//!
//! Discovery enumerates the immediate subdirectories of the modules root and
//! handles each candidate fully (manifest → probe → register → initialize →
//! activate) before the next one starts. Every per-module failure is
//! isolated: it removes only that module from the active set, is logged with
//! the module name, and never aborts the pass.
//!
//! The resulting active set is cached behind a dirty flag. With
//! `hot_reload` enabled, a filesystem watch on the modules root marks the
//! cache dirty on any change; without it the cache lives for the process.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use notify::{RecursiveMode, Watcher};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use opshub_core::config::plugin::PluginConfig;
use opshub_core::manifest::PluginManifest;
use opshub_core::types::NavItem;

use crate::registry::PluginRegistry;
use crate::resolver::PluginResolver;
use crate::snapshot::PluginClientSnapshot;
use crate::traits::LoadedPlugin;

/// Checks a candidate directory name before any filesystem or probe access.
///
/// Rejects traversal sequences and anything outside `[A-Za-z0-9_-]` so a
/// crafted directory name can never escape the modules root.
pub fn is_safe_module_name(name: &str) -> bool {
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Discovers and activates modules from the filesystem.
#[derive(Debug)]
pub struct PluginLoader {
    config: PluginConfig,
    registry: Arc<PluginRegistry>,
    resolver: Arc<PluginResolver>,
    /// Active set from the last discovery pass.
    cache: RwLock<Option<Vec<Arc<LoadedPlugin>>>>,
    /// Set when the cache must be rebuilt on the next load.
    dirty: Arc<AtomicBool>,
    /// Filesystem watcher, kept alive while hot reload is on.
    watcher: std::sync::Mutex<Option<notify::RecommendedWatcher>>,
}

impl PluginLoader {
    /// Creates a loader over the configured modules root.
    pub fn new(
        config: PluginConfig,
        registry: Arc<PluginRegistry>,
        resolver: Arc<PluginResolver>,
    ) -> Self {
        Self {
            config,
            registry,
            resolver,
            cache: RwLock::new(None),
            dirty: Arc::new(AtomicBool::new(true)),
            watcher: std::sync::Mutex::new(None),
        }
    }

    /// Returns the active module set, re-discovering only when the cache is
    /// dirty.
    pub async fn load_plugins(&self) -> Vec<Arc<LoadedPlugin>> {
        if !self.dirty.load(Ordering::SeqCst) {
            if let Some(cached) = self.cache.read().await.as_ref() {
                return cached.clone();
            }
        }

        self.dirty.store(false, Ordering::SeqCst);

        // A rebuild replaces the previous generation wholesale, so stale
        // registrations must not shadow the incoming pass.
        let previous = self.cache.write().await.take();
        if let Some(previous) = previous {
            for module in previous {
                self.registry.unregister(module.name()).await;
            }
        }

        let modules = self.discover().await;
        *self.cache.write().await = Some(modules.clone());
        modules
    }

    /// Marks the cache dirty, forcing re-discovery on the next load.
    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Returns the active module with the given manifest name.
    pub async fn get_plugin_by_name(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        self.load_plugins()
            .await
            .into_iter()
            .find(|m| m.name() == name)
    }

    /// Builds the serializable projection handed to the client shell.
    ///
    /// A module whose nav-item introspection fails contributes zero items
    /// and is logged; the snapshot itself always succeeds.
    pub async fn client_snapshot(&self) -> PluginClientSnapshot {
        let modules = self.load_plugins().await;
        let manifests: Vec<PluginManifest> =
            modules.iter().map(|m| m.manifest().clone()).collect();
        let nav_items: Vec<NavItem> = modules
            .iter()
            .flat_map(|m| match m.nav_items() {
                Ok(items) => items,
                Err(e) => {
                    error!(module = %m.name(), error = %e, "Failed to collect nav items");
                    Vec::new()
                }
            })
            .collect();

        PluginClientSnapshot {
            manifests,
            nav_items,
        }
    }

    /// One full discovery pass over the modules root.
    async fn discover(&self) -> Vec<Arc<LoadedPlugin>> {
        self.ensure_watcher();

        let names = match self.list_module_dirs().await {
            Ok(names) => names,
            Err(e) => {
                error!(dir = %self.config.modules_dir, error = %e, "Failed to scan modules directory");
                return Vec::new();
            }
        };

        let available_ids: HashSet<String> = names.iter().cloned().collect();

        // Read and validate manifests first so the batch can be
        // dependency-ordered before anything activates.
        let mut candidates = Vec::new();
        for name in &names {
            if let Some(manifest) = self.read_manifest(name).await {
                if !manifest.enabled {
                    debug!(module = %name, "Module disabled, skipping");
                    continue;
                }
                candidates.push(manifest);
            }
        }

        let mut loaded = Vec::new();
        for manifest in order_by_dependencies(candidates) {
            let name = manifest.name.clone();

            let Some(module) = self.resolver.probe(&name).await else {
                warn!(module = %name, "No implementation satisfies the module contract");
                continue;
            };

            let module = Arc::new(LoadedPlugin::new(manifest, module));

            if !self.registry.register(module.clone(), &available_ids).await {
                continue;
            }

            let started = async {
                module.initialize().await?;
                module.activate().await
            };
            if let Err(e) = started.await {
                error!(module = %name, error = %e, "Module failed to start");
                self.registry.unregister(&name).await;
                continue;
            }

            loaded.push(module);
        }

        loaded
    }

    /// Lists safe module directory names under the modules root.
    async fn list_module_dirs(&self) -> std::io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.config.modules_dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!("Skipping module directory with non-UTF-8 name");
                continue;
            };
            if !is_safe_module_name(&name) {
                warn!(module = %name, "Rejected unsafe module directory name");
                continue;
            }
            names.push(name);
        }

        Ok(names)
    }

    /// Reads and validates one module's manifest.
    ///
    /// A missing manifest means the directory is not a module; a malformed
    /// one is logged with the offending fields. Both skip the candidate.
    async fn read_manifest(&self, name: &str) -> Option<PluginManifest> {
        let path = Path::new(&self.config.modules_dir)
            .join(name)
            .join("manifest.json");

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(module = %name, "No manifest.json, skipping");
                return None;
            }
            Err(e) => {
                error!(module = %name, error = %e, "Failed to read manifest.json");
                return None;
            }
        };

        match PluginManifest::from_json(&raw) {
            Ok(manifest) => {
                if manifest.name != name {
                    warn!(
                        module = %name,
                        manifest_name = %manifest.name,
                        "Manifest name does not match its directory, skipping"
                    );
                    return None;
                }
                Some(manifest)
            }
            Err(e) => {
                warn!(module = %name, error = %e, "Invalid manifest, skipping");
                None
            }
        }
    }

    /// Installs the modules-root watcher once, when hot reload is enabled.
    fn ensure_watcher(&self) {
        if !self.config.hot_reload {
            return;
        }
        let mut guard = match self.watcher.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.is_some() {
            return;
        }

        let dirty = self.dirty.clone();
        let watcher = notify::recommended_watcher(
            move |result: Result<notify::Event, notify::Error>| match result {
                Ok(_) => {
                    dirty.store(true, Ordering::SeqCst);
                    debug!("Modules directory changed, cache invalidated");
                }
                Err(e) => warn!(error = %e, "Module watch error"),
            },
        );

        match watcher {
            Ok(mut watcher) => {
                let root = Path::new(&self.config.modules_dir);
                if let Err(e) = watcher.watch(root, RecursiveMode::Recursive) {
                    warn!(error = %e, "Failed to watch modules directory, hot reload disabled");
                    return;
                }
                *guard = Some(watcher);
            }
            Err(e) => {
                warn!(error = %e, "Failed to create module watcher, hot reload disabled");
            }
        }
    }
}

/// Orders a discovery batch so dependencies come before their dependents.
///
/// Dependencies outside the batch are ignored here (the registry settles
/// them). Cycles are logged and their members appended in discovery order.
fn order_by_dependencies(candidates: Vec<PluginManifest>) -> Vec<PluginManifest> {
    let mut remaining: Vec<PluginManifest> = candidates;
    let in_batch: HashSet<String> = remaining.iter().map(|m| m.name.clone()).collect();
    let mut placed: HashSet<String> = HashSet::new();
    let mut ordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let mut progressed = false;
        let mut index = 0;
        while index < remaining.len() {
            let ready = remaining[index]
                .dependencies
                .iter()
                .all(|dep| !in_batch.contains(dep) || placed.contains(dep));
            if ready {
                let manifest = remaining.remove(index);
                placed.insert(manifest.name.clone());
                ordered.push(manifest);
                progressed = true;
            } else {
                index += 1;
            }
        }

        if !progressed {
            let cycle: Vec<&str> = remaining.iter().map(|m| m.name.as_str()).collect();
            warn!(modules = ?cycle, "Dependency cycle in discovery batch, keeping discovery order");
            ordered.extend(remaining);
            break;
        }
    }

    ordered
}
