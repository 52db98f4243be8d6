//! Run a shell command and report its outcome to a Telegram chat.
//!
//! The flow is strictly sequential: [`executor`] runs the command,
//! [`notification::report`] composes the message, a
//! [`notification::NotificationChannel`] delivers it, and [`runner`] decides
//! the process exit status.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod notification;
pub mod runner;
pub mod utils;

pub use error::{DeliveryError, Error, Result};
