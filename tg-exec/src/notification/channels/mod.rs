//! Notification channels.
//!
//! Telegram is the only delivery backend.

mod telegram;

pub use telegram::{TELEGRAM_API_BASE, TelegramChannel, TelegramConfig};

use async_trait::async_trait;

use crate::error::DeliveryError;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Check if the channel is enabled.
    fn is_enabled(&self) -> bool;

    /// Deliver a composed report. The text is sent whole or not at all.
    async fn send(&self, report: &str) -> Result<(), DeliveryError>;
}
