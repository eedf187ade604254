//! Outbound notification events.

use serde::{Deserialize, Serialize};

use super::EventPayload;

/// Delivery channel for an outbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    /// Text message.
    Sms,
    /// E-mail.
    Email,
    /// Mobile/web push.
    Push,
}

/// Request to deliver a notification to a recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSend {
    /// Delivery channel.
    #[serde(rename = "type")]
    pub channel: NotificationChannel,
    /// Recipient address (phone number, e-mail, device token).
    pub to: String,
    /// Message body.
    pub message: String,
}

impl EventPayload for NotificationSend {
    const TOPIC: &'static str = "notification.send";
}
