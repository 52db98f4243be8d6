//! Telegram Bot API notification channel.
//!
//! Sends reports via the Telegram Bot API (`POST /bot<token>/sendMessage`)
//! as a form-encoded request. Failed attempts are retried with exponential
//! backoff; each attempt gets its own deadline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::NotificationChannel;
use crate::error::DeliveryError;
use crate::utils::http_client::install_rustls_provider;

/// Public Bot API root.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram channel configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Telegram Bot API token.
    pub bot_token: String,
    /// Target chat ID (user, group, or channel).
    pub chat_id: String,
    /// Parse mode for message formatting (HTML, Markdown, MarkdownV2).
    pub parse_mode: String,
    /// Deadline for a single attempt, response body included.
    pub timeout: Duration,
    /// Attempt count; values below one still make a single attempt.
    pub retries: u32,
    /// Initial sleep between attempts.
    pub backoff: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            parse_mode: "HTML".to_string(),
            timeout: Duration::from_secs(10),
            retries: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Subset of the Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram notification channel.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: Client,
    api_base: String,
}

impl TelegramChannel {
    /// Create a new Telegram channel.
    pub fn new(config: TelegramConfig) -> Self {
        install_rustls_provider();
        Self {
            config,
            client: Client::new(),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    /// Point the channel at another Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Number of attempts a delivery will make at most.
    pub fn max_attempts(&self) -> u32 {
        self.config.retries.max(1)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    /// Deliver `text`, retrying failed attempts.
    ///
    /// Returns [`DeliveryError::Exhausted`] carrying the last attempt's
    /// cause once every attempt has failed.
    pub async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        let form = [
            ("chat_id", self.config.chat_id.as_str()),
            ("text", text),
            ("parse_mode", self.config.parse_mode.as_str()),
        ];
        let attempts = self.max_attempts();
        let mut backoff = self.config.backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                attempt,
                attempts,
                timeout = ?self.config.timeout,
                backoff = ?backoff,
                "Sending Telegram message"
            );

            let result = tokio::time::timeout(self.config.timeout, self.send_once(&form))
                .await
                .unwrap_or_else(|_| Err(DeliveryError::Timeout(self.config.timeout)));

            let error = match result {
                Ok(()) => {
                    debug!(attempt, "Telegram message sent");
                    return Ok(());
                }
                Err(e) => e,
            };

            if attempt >= attempts {
                return Err(DeliveryError::Exhausted {
                    attempts,
                    source: Box::new(error),
                });
            }

            warn!(
                "Telegram attempt {}/{} failed: {}; retrying in {:?}",
                attempt, attempts, error, backoff
            );
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2);
        }
    }

    /// One request/response round trip.
    async fn send_once(&self, form: &[(&str, &str)]) -> Result<(), DeliveryError> {
        // The request URL embeds the token, keep it out of error text.
        let response = self
            .client
            .post(self.endpoint())
            .form(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url()))?;
        debug!(status = status.as_u16(), body = %body, "Telegram response");

        let reply = serde_json::from_str::<ApiReply>(&body).ok();
        if status.is_success() && reply.as_ref().is_some_and(|r| r.ok) {
            return Ok(());
        }

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            description: reply.and_then(|r| r.description).unwrap_or(body),
        })
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn channel_type(&self) -> &'static str {
        "telegram"
    }

    fn is_enabled(&self) -> bool {
        !self.config.bot_token.is_empty() && !self.config.chat_id.is_empty()
    }

    async fn send(&self, report: &str) -> Result<(), DeliveryError> {
        self.deliver(report).await
    }
}
