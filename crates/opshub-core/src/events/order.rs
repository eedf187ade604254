//! Order lifecycle events.

use serde::{Deserialize, Serialize};

use super::EventPayload;

/// A new order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    /// The order ID.
    pub order_id: String,
    /// Total order amount.
    pub amount: f64,
    /// The customer who placed the order.
    pub customer_id: String,
}

impl EventPayload for OrderCreated {
    const TOPIC: &'static str = "order.created";
}

/// An order changed status (e.g. dispatched, delivered).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdated {
    /// The order ID.
    pub order_id: String,
    /// The new status.
    pub status: String,
}

impl EventPayload for OrderUpdated {
    const TOPIC: &'static str = "order.updated";
}

/// An order was removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDeleted {
    /// The order ID.
    pub order_id: String,
}

impl EventPayload for OrderDeleted {
    const TOPIC: &'static str = "order.deleted";
}
