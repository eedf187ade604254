//! Module implementation and lifecycle wiring.

use std::sync::Arc;

use tracing::info;

use opshub_plugin_sdk::prelude::*;

use crate::handlers::LedgerHandler;

/// Directory and manifest name of this module.
pub const MODULE_NAME: &str = "finance";

/// The finance ledger module.
#[derive(Debug)]
pub struct FinancePlugin {
    bus: Arc<EventBus>,
}

impl FinancePlugin {
    /// Creates the module over the shared event bus.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl PluginModule for FinancePlugin {
    async fn activate(&self) -> AppResult<()> {
        let handler = Arc::new(LedgerHandler::new(self.bus.clone()));
        self.bus
            .subscribe(OrderCreated::TOPIC, handler.clone(), Some(MODULE_NAME))
            .await;
        self.bus
            .subscribe(PaymentReceived::TOPIC, handler, Some(MODULE_NAME))
            .await;
        info!(module = MODULE_NAME, "Ledger recording active");
        Ok(())
    }

    async fn deactivate(&self) -> AppResult<()> {
        self.bus.unsubscribe_all(MODULE_NAME).await;
        Ok(())
    }

    fn routes(&self, manifest: &PluginManifest) -> AppResult<Vec<PluginRoute>> {
        Ok(vec![PluginRoute {
            path: manifest.route.clone(),
            component: "FinancePage".to_string(),
        }])
    }

    fn nav_items(&self, manifest: &PluginManifest) -> AppResult<Vec<NavItem>> {
        Ok(vec![NavItem::from_manifest(manifest)])
    }
}
