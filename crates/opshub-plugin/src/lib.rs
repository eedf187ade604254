//! # opshub-plugin
//!
//! Plugin framework for OpsHub. Provides:
//!
//! - Module contract and lifecycle (initialize, activate, deactivate)
//! - Module registry enforcing uniqueness and dependency satisfaction
//! - Cached filesystem loader with manifest validation and hot reload
//! - Typed publish/subscribe event bus with glob topic matching
//! - Serializable client snapshot (manifests + navigation)
//! - Optional dynamic loading via `libloading` (feature `dynamic`)

pub mod bus;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod snapshot;
pub mod traits;

pub use bus::{EventBus, EventHandler, FnHandler, Subscription};
pub use loader::PluginLoader;
pub use registry::PluginRegistry;
pub use resolver::PluginResolver;
pub use snapshot::PluginClientSnapshot;
pub use traits::{LoadedPlugin, PluginModule};
