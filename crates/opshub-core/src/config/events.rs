//! Event bus configuration.

use serde::{Deserialize, Serialize};

/// Event bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBusConfig {
    /// Maximum number of events retained in history (oldest dropped first).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Default per-handler dispatch timeout in milliseconds.
    #[serde(default = "default_dispatch_timeout_ms")]
    pub dispatch_timeout_ms: u64,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            dispatch_timeout_ms: default_dispatch_timeout_ms(),
        }
    }
}

fn default_history_capacity() -> usize {
    100
}

fn default_dispatch_timeout_ms() -> u64 {
    5000
}
