//! Event handlers owned by the finance module.

use std::sync::Arc;

use tracing::debug;

use opshub_plugin_sdk::prelude::*;

use crate::plugin::MODULE_NAME;

/// Records income transactions for orders and settled payments.
#[derive(Debug)]
pub struct LedgerHandler {
    bus: Arc<EventBus>,
}

impl LedgerHandler {
    /// Creates the handler over the shared bus.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    async fn record(&self, amount: f64, category: &str) -> AppResult<()> {
        self.bus
            .publish_typed(
                FinanceTransaction {
                    kind: TransactionKind::Income,
                    amount,
                    category: category.to_string(),
                },
                MODULE_NAME,
            )
            .await
    }
}

#[async_trait]
impl EventHandler for LedgerHandler {
    async fn handle(&self, event: Arc<PluginEvent>) -> AppResult<()> {
        match event.topic.as_str() {
            OrderCreated::TOPIC => {
                let order: OrderCreated = serde_json::from_value(event.payload.clone())?;
                self.record(order.amount, "orders").await
            }
            PaymentReceived::TOPIC => {
                let payment: PaymentReceived = serde_json::from_value(event.payload.clone())?;
                self.record(payment.amount, "payments").await
            }
            other => {
                debug!(module = MODULE_NAME, topic = %other, "Ignoring event");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    async fn bus_with_ledger() -> (Arc<EventBus>, Arc<Mutex<Vec<FinanceTransaction>>>) {
        let bus = Arc::new(EventBus::new());
        let handler = Arc::new(LedgerHandler::new(bus.clone()));
        bus.subscribe(OrderCreated::TOPIC, handler.clone(), Some(MODULE_NAME))
            .await;
        bus.subscribe(PaymentReceived::TOPIC, handler, Some(MODULE_NAME))
            .await;

        let ledger = Arc::new(Mutex::new(Vec::new()));
        let sink = ledger.clone();
        bus.subscribe(
            FinanceTransaction::TOPIC,
            FnHandler::new(move |event| {
                let sink = sink.clone();
                async move {
                    let tx: FinanceTransaction =
                        serde_json::from_value(event.payload.clone()).unwrap();
                    sink.lock().await.push(tx);
                    Ok(())
                }
            }),
            None,
        )
        .await;

        (bus, ledger)
    }

    #[tokio::test]
    async fn payments_land_in_the_ledger() {
        let (bus, ledger) = bus_with_ledger().await;

        bus.publish_typed(
            PaymentReceived {
                order_id: "ORD-7".to_string(),
                amount: 120.0,
                method: "card".to_string(),
            },
            "api",
        )
        .await
        .unwrap();

        let entries = ledger.lock().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, TransactionKind::Income);
        assert_eq!(entries[0].amount, 120.0);
        assert_eq!(entries[0].category, "payments");
    }

    #[tokio::test]
    async fn orders_are_booked_under_orders_category() {
        let (bus, ledger) = bus_with_ledger().await;

        bus.publish_typed(
            OrderCreated {
                order_id: "ORD-8".to_string(),
                amount: 55.0,
                customer_id: "CUST-1".to_string(),
            },
            "api",
        )
        .await
        .unwrap();

        let entries = ledger.lock().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, "orders");
    }
}
