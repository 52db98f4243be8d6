//! Notification system module.
//!
//! - [`report`] turns an execution outcome into escaped HTML text.
//! - [`channels`] delivers that text, retrying with exponential backoff.
//!
//! # Example
//!
//! ```ignore
//! use tg_exec::notification::channels::{NotificationChannel, TelegramChannel, TelegramConfig};
//! use tg_exec::notification::report::{ReportOptions, compose};
//!
//! let text = compose(&outcome, &ReportOptions::default());
//! let channel = TelegramChannel::new(TelegramConfig {
//!     bot_token: "123:ABC".to_string(),
//!     chat_id: "456".to_string(),
//!     ..Default::default()
//! });
//! channel.send(&text).await?;
//! ```

pub mod channels;
pub mod report;

pub use channels::{NotificationChannel, TelegramChannel, TelegramConfig};
pub use report::{ReportOptions, compose, escape_html};
