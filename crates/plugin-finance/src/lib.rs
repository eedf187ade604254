//! Finance module for OpsHub.
//!
//! Records ledger transactions for order and payment activity. Depends on
//! the `ops` module being active.

pub mod handlers;
pub mod plugin;

pub use plugin::{FinancePlugin, MODULE_NAME};
