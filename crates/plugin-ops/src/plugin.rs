//! Module implementation and lifecycle wiring.

use std::sync::Arc;

use tracing::info;

use opshub_plugin_sdk::prelude::*;

use crate::handlers::OrderEventsHandler;

/// Directory and manifest name of this module.
pub const MODULE_NAME: &str = "ops";

/// The operations module.
///
/// Activation subscribes the order-events handler under this module's
/// subscriber identity; deactivation tears all of it down in one call.
#[derive(Debug)]
pub struct OpsPlugin {
    bus: Arc<EventBus>,
}

impl OpsPlugin {
    /// Creates the module over the shared event bus.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl PluginModule for OpsPlugin {
    async fn activate(&self) -> AppResult<()> {
        let handler = Arc::new(OrderEventsHandler::new(self.bus.clone()));
        self.bus
            .subscribe("order.*", handler, Some(MODULE_NAME))
            .await;
        info!(module = MODULE_NAME, "Order event handling active");
        Ok(())
    }

    async fn deactivate(&self) -> AppResult<()> {
        self.bus.unsubscribe_all(MODULE_NAME).await;
        Ok(())
    }

    fn routes(&self, manifest: &PluginManifest) -> AppResult<Vec<PluginRoute>> {
        Ok(vec![PluginRoute {
            path: manifest.route.clone(),
            component: "OpsPage".to_string(),
        }])
    }

    fn nav_items(&self, manifest: &PluginManifest) -> AppResult<Vec<NavItem>> {
        Ok(vec![NavItem::from_manifest(manifest)])
    }
}
