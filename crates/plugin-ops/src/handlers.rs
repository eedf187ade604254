//! Event handlers owned by the operations module.

use std::sync::Arc;

use tracing::debug;

use opshub_plugin_sdk::prelude::*;

use crate::plugin::MODULE_NAME;

/// Turns order lifecycle events into dispatcher notifications.
#[derive(Debug)]
pub struct OrderEventsHandler {
    bus: Arc<EventBus>,
}

impl OrderEventsHandler {
    /// Creates the handler over the shared bus.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    async fn notify(&self, message: String) -> AppResult<()> {
        self.bus
            .publish_typed(
                NotificationSend {
                    channel: NotificationChannel::Push,
                    to: "dispatch".to_string(),
                    message,
                },
                MODULE_NAME,
            )
            .await
    }
}

#[async_trait]
impl EventHandler for OrderEventsHandler {
    async fn handle(&self, event: Arc<PluginEvent>) -> AppResult<()> {
        match event.topic.as_str() {
            OrderCreated::TOPIC => {
                let order: OrderCreated = serde_json::from_value(event.payload.clone())?;
                self.notify(format!(
                    "New order {} for {} ({:.2})",
                    order.order_id, order.customer_id, order.amount
                ))
                .await
            }
            OrderUpdated::TOPIC => {
                let order: OrderUpdated = serde_json::from_value(event.payload.clone())?;
                self.notify(format!("Order {} is now {}", order.order_id, order.status))
                    .await
            }
            other => {
                // order.deleted and any future order.* topics need no
                // dispatcher notification.
                debug!(module = MODULE_NAME, topic = %other, "Ignoring order event");
                Ok(())
            }
        }
    }
}
