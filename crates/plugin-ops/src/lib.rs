//! Operations (orders) module for OpsHub.
//!
//! Watches order lifecycle events and turns them into outbound dispatcher
//! notifications.

pub mod handlers;
pub mod plugin;

pub use plugin::{MODULE_NAME, OpsPlugin};
