//! Module contract and the loaded-module wrapper.

use std::sync::Arc;

use async_trait::async_trait;

use opshub_core::manifest::PluginManifest;
use opshub_core::result::AppResult;
use opshub_core::types::{NavItem, PluginRoute};

/// Trait that all OpsHub modules implement.
///
/// Every method has a no-op default, so concrete modules only override what
/// they need. The manifest is **not** part of the implementation: the loader
/// pairs each instance with the manifest read from disk, which is
/// authoritative, and passes it back in for introspection.
#[async_trait]
pub trait PluginModule: Send + Sync + std::fmt::Debug {
    /// Called once after registration, before activation.
    async fn initialize(&self) -> AppResult<()> {
        Ok(())
    }

    /// Called after a successful `initialize`; the module is live afterwards.
    async fn activate(&self) -> AppResult<()> {
        Ok(())
    }

    /// Administrative shutdown of the module. Never invoked automatically.
    async fn deactivate(&self) -> AppResult<()> {
        Ok(())
    }

    /// Install hook, for first-time provisioning.
    async fn on_install(&self) -> AppResult<()> {
        Ok(())
    }

    /// Uninstall hook, for cleanup when the module is removed.
    async fn on_uninstall(&self) -> AppResult<()> {
        Ok(())
    }

    /// Update hook, invoked when the module version changes.
    async fn on_update(&self) -> AppResult<()> {
        Ok(())
    }

    /// Routes this module contributes to the shell.
    fn routes(&self, _manifest: &PluginManifest) -> AppResult<Vec<PluginRoute>> {
        Ok(Vec::new())
    }

    /// Navigation entries this module contributes to the shell.
    fn nav_items(&self, _manifest: &PluginManifest) -> AppResult<Vec<NavItem>> {
        Ok(Vec::new())
    }
}

/// A module paired with its validated on-disk manifest.
///
/// Owned by the registry once accepted; the loader only holds a transient
/// reference during construction.
#[derive(Debug)]
pub struct LoadedPlugin {
    manifest: PluginManifest,
    module: Arc<dyn PluginModule>,
}

impl LoadedPlugin {
    /// Pairs a validated manifest with a module implementation.
    pub fn new(manifest: PluginManifest, module: Arc<dyn PluginModule>) -> Self {
        Self { manifest, module }
    }

    /// The module's unique name (registry key).
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// The authoritative manifest.
    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    /// Runs the module's initialization.
    pub async fn initialize(&self) -> AppResult<()> {
        self.module.initialize().await
    }

    /// Activates the module.
    pub async fn activate(&self) -> AppResult<()> {
        self.module.activate().await
    }

    /// Deactivates the module (administrative trigger only).
    pub async fn deactivate(&self) -> AppResult<()> {
        self.module.deactivate().await
    }

    /// Routes contributed by the module.
    pub fn routes(&self) -> AppResult<Vec<PluginRoute>> {
        self.module.routes(&self.manifest)
    }

    /// Navigation entries contributed by the module.
    pub fn nav_items(&self) -> AppResult<Vec<NavItem>> {
        self.module.nav_items(&self.manifest)
    }
}
