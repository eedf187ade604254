//! Domain events published on the plugin event bus.
//!
//! Events are dispatched in-process through the event bus and consumed by
//! feature modules (orders, finance, notifications) and arbitrary
//! application code. The bus accepts any topic string; the sub-modules here
//! define the well-known topics and their payload shapes.

pub mod finance;
pub mod notification;
pub mod order;
pub mod payment;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use finance::{FinanceTransaction, TransactionKind};
pub use notification::{NotificationChannel, NotificationSend};
pub use order::{OrderCreated, OrderDeleted, OrderUpdated};
pub use payment::PaymentReceived;

/// An immutable event record carried through the bus and its history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginEvent {
    /// Dot-segmented topic, e.g. `order.created`.
    pub topic: String,
    /// Arbitrary JSON payload.
    pub payload: Value,
    /// Identifier of the publisher (module name or `system`).
    pub source: String,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
}

impl PluginEvent {
    /// Create a new event stamped with the current time.
    pub fn new(topic: impl Into<String>, payload: Value, source: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload,
            source: source.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Binds a payload type to its well-known topic.
///
/// Implemented by the payload structs in this module so that
/// `EventBus::publish_typed` can derive the topic from the type.
pub trait EventPayload: Serialize {
    /// The topic this payload is published under.
    const TOPIC: &'static str;
}
