//! Finance ledger events.

use serde::{Deserialize, Serialize};

use super::EventPayload;

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

/// A ledger entry recorded by the finance module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceTransaction {
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Transaction amount.
    pub amount: f64,
    /// Ledger category (e.g. `orders`, `payments`, `fuel`).
    pub category: String,
}

impl EventPayload for FinanceTransaction {
    const TOPIC: &'static str = "finance.transaction";
}
