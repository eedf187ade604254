//! # opshub-plugin-sdk
//!
//! SDK for developing OpsHub dashboard modules.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use opshub_plugin_sdk::prelude::*;
//!
//! #[derive(Debug)]
//! struct MyModule;
//!
//! #[async_trait]
//! impl PluginModule for MyModule {
//!     async fn activate(&self) -> AppResult<()> {
//!         Ok(())
//!     }
//!
//!     fn nav_items(&self, manifest: &PluginManifest) -> AppResult<Vec<NavItem>> {
//!         Ok(vec![NavItem::from_manifest(manifest)])
//!     }
//! }
//! ```
//!
//! Modules compiled into the server register through
//! `PluginResolver::register_builtin`; modules built as shared libraries
//! (feature `dynamic` on `opshub-plugin`) export themselves with
//! [`export_plugin!`].

/// Prelude for convenient imports.
pub mod prelude {
    pub use async_trait::async_trait;

    pub use opshub_core::events::{
        EventPayload, FinanceTransaction, NotificationChannel, NotificationSend, OrderCreated,
        OrderDeleted, OrderUpdated, PaymentReceived, PluginEvent, TransactionKind,
    };
    pub use opshub_core::manifest::PluginManifest;
    pub use opshub_core::result::AppResult;
    pub use opshub_core::types::{NavItem, PluginRoute};

    pub use opshub_plugin::bus::{EventBus, EventHandler, FnHandler, Subscription};
    pub use opshub_plugin::traits::PluginModule;
}

/// Exports a module constructor from a shared-library module.
///
/// Expands to the `opshub_plugin_create` symbol the dynamic resolver looks
/// up. Only meaningful in a `cdylib` crate loaded behind the `dynamic`
/// feature.
#[macro_export]
macro_rules! export_plugin {
    ($ctor:expr) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn opshub_plugin_create()
        -> *mut dyn $crate::prelude::PluginModule {
            // Paired with Arc::from_raw in the dynamic resolver.
            ::std::sync::Arc::into_raw(
                ::std::sync::Arc::new($ctor) as ::std::sync::Arc<dyn $crate::prelude::PluginModule>
            ) as *mut dyn $crate::prelude::PluginModule
        }
    };
}
