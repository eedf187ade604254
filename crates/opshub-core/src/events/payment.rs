//! Payment events.

use serde::{Deserialize, Serialize};

use super::EventPayload;

/// A payment was received for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceived {
    /// The order the payment settles.
    pub order_id: String,
    /// Amount received.
    pub amount: f64,
    /// Payment method (e.g. `card`, `cash`, `invoice`).
    pub method: String,
}

impl EventPayload for PaymentReceived {
    const TOPIC: &'static str = "payment.received";
}
