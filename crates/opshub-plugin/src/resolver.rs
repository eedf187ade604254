//! Module implementation resolution — the dynamic-discovery boundary.
//!
//! Discovery only learns module *names* from the filesystem; the
//! implementation behind a name is resolved here. Built-in (compiled-in)
//! modules register themselves at startup and are probed by name; the probe
//! returning `None` is the runtime equivalent of an import that does not
//! satisfy the module contract. Out-of-tree modules can be loaded from
//! shared libraries behind the `dynamic` feature.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::traits::PluginModule;

/// Resolves module names to implementations.
#[derive(Debug, Default)]
pub struct PluginResolver {
    /// Module name → compiled-in implementation.
    builtins: RwLock<HashMap<String, Arc<dyn PluginModule>>>,
}

impl PluginResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a compiled-in module implementation under a name.
    ///
    /// The name must match the module's directory under the modules root.
    pub async fn register_builtin(&self, name: &str, module: Arc<dyn PluginModule>) {
        debug!(module = %name, "Built-in module implementation registered");
        self.builtins
            .write()
            .await
            .insert(name.to_string(), module);
    }

    /// Probes for an implementation satisfying the module contract.
    pub async fn probe(&self, name: &str) -> Option<Arc<dyn PluginModule>> {
        self.builtins.read().await.get(name).cloned()
    }

    /// Names of all resolvable implementations.
    pub async fn known_modules(&self) -> Vec<String> {
        self.builtins.read().await.keys().cloned().collect()
    }
}

/// Dynamic module loading via `libloading` (feature-gated).
#[cfg(feature = "dynamic")]
pub mod dynamic {
    use std::path::Path;
    use std::sync::Arc;

    use tracing::info;

    use opshub_core::error::AppError;

    use crate::traits::PluginModule;

    /// Type of the creation function exported by dynamic modules.
    ///
    /// Dynamic modules must export:
    /// `extern "C" fn opshub_plugin_create() -> *mut dyn PluginModule`
    /// (see the `export_plugin!` macro in the SDK crate).
    pub type CreatePluginFn = unsafe extern "C" fn() -> *mut dyn PluginModule;

    /// Loads module implementations from shared libraries.
    pub struct DynamicResolver {
        /// Loaded libraries (kept alive for the lifetime of the resolver).
        _libraries: Vec<libloading::Library>,
    }

    impl DynamicResolver {
        /// Creates a new dynamic resolver.
        pub fn new() -> Self {
            Self {
                _libraries: Vec::new(),
            }
        }

        /// Loads a module from the given shared library path.
        ///
        /// # Safety
        /// This function loads arbitrary code from a shared library.
        /// Only load trusted modules.
        pub unsafe fn load_from_path(
            &mut self,
            path: &Path,
        ) -> Result<Arc<dyn PluginModule>, AppError> {
            let lib = unsafe { libloading::Library::new(path) }.map_err(|e| {
                AppError::plugin(format!(
                    "Failed to load module library '{}': {}",
                    path.display(),
                    e
                ))
            })?;

            let create_fn: libloading::Symbol<CreatePluginFn> =
                unsafe { lib.get(b"opshub_plugin_create") }.map_err(|e| {
                    AppError::plugin(format!(
                        "Module '{}' missing 'opshub_plugin_create' symbol: {}",
                        path.display(),
                        e
                    ))
                })?;

            let raw_module = unsafe { create_fn() };
            let module = unsafe { Arc::from_raw(raw_module) };

            info!(path = %path.display(), "Dynamic module loaded");

            self._libraries.push(lib);

            Ok(module)
        }
    }

    impl Default for DynamicResolver {
        fn default() -> Self {
            Self::new()
        }
    }

    impl std::fmt::Debug for DynamicResolver {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("DynamicResolver")
                .field("loaded_count", &self._libraries.len())
                .finish()
        }
    }
}
