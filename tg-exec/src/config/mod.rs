//! Typed configuration, resolved once at startup.
//!
//! Values come from [`ConfigLayers`] in fixed precedence (environment,
//! user file, system file, built-in default). The resulting [`AppConfig`]
//! is immutable and handed to the components that need it.

mod layers;
mod timezone;

use std::time::Duration;

use tracing::warn;

pub use layers::{
    ConfigLayers, Key, SYSTEM_CONFIG_PATH, parse_kv, read_kv_file, user_config_path,
};
pub use timezone::{ReportZone, TIMESTAMP_FORMAT};

use crate::notification::channels::{TELEGRAM_API_BASE, TelegramConfig};
use crate::notification::report::ReportOptions;
use crate::{Error, Result};

pub const DEFAULT_PARSE_MODE: &str = "HTML";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);
pub const DEFAULT_ALWAYS_INCLUDE_OUTPUT: bool = true;

/// Telegram `sendMessage` text limit.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 4096;

pub mod keys {
    use super::Key;

    pub const TOKEN: Key = Key::new("TELEGRAM_BOT_TOKEN", &["TELEGRAM_BOT_TOKEN", "TOKEN"]);
    pub const CHAT_ID: Key = Key::new("TELEGRAM_CHAT_ID", &["TELEGRAM_CHAT_ID", "CHAT_ID"]);
    pub const NOTE: Key = Key::new("TG_NOTE", &["TG_NOTE", "NOTE"]);
    pub const ALWAYS: Key = Key::new("TG_EXEC_ALWAYS", &["TG_EXEC_ALWAYS", "ALWAYS"]);
    pub const PARSE_MODE: Key =
        Key::new("TG_EXEC_PARSE_MODE", &["TG_EXEC_PARSE_MODE", "PARSE_MODE"]);
    pub const TIMEOUT: Key =
        Key::new("TG_EXEC_HTTP_TIMEOUT", &["TG_EXEC_HTTP_TIMEOUT", "HTTP_TIMEOUT"]);
    pub const RETRIES: Key = Key::new("TG_EXEC_RETRIES", &["TG_EXEC_RETRIES", "RETRIES"]);
    pub const BACKOFF: Key = Key::new("TG_EXEC_BACKOFF", &["TG_EXEC_BACKOFF", "BACKOFF"]);
    pub const STRICT: Key = Key::new("TG_EXEC_STRICT", &["TG_EXEC_STRICT", "STRICT"]);
    pub const TIMEZONE: Key = Key::new("TG_EXEC_TZ", &["TG_EXEC_TZ", "TIMEZONE"]);
    pub const DEBUG: Key = Key::new("DEBUG", &["DEBUG"]);
    pub const MAX_CHARS: Key = Key::new("TG_EXEC_MAX_CHARS", &["TG_EXEC_MAX_CHARS", "MAX_CHARS"]);
    pub const API_URL: Key = Key::new("TG_EXEC_API_URL", &["TG_EXEC_API_URL", "API_URL"]);

    /// Plain environment fallback for the report timezone.
    pub const TZ_ENV: &str = "TZ";
}

/// Fully resolved configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Telegram bot token.
    pub token: String,
    /// Target chat ID (user, group, or channel).
    pub chat_id: String,
    /// Annotation shown in the report; empty means none.
    pub note: String,
    /// Include output in success reports too.
    pub always_include_output: bool,
    /// Telegram parse mode sent with the message.
    pub parse_mode: String,
    /// Deadline for each delivery attempt.
    pub timeout: Duration,
    /// Requested attempt count; fewer than one still sends once.
    pub retries: u32,
    /// Sleep before the second attempt, doubled after each failure.
    pub backoff: Duration,
    /// Turn a failed delivery into a failing exit status.
    pub strict: bool,
    /// IANA zone name for report timestamps.
    pub timezone: Option<String>,
    pub debug: bool,
    /// Report length cap; `0` disables truncation.
    pub max_message_chars: usize,
    /// Bot API root URL.
    pub api_base: String,
}

impl AppConfig {
    /// Resolve from the process environment and the config files.
    pub fn load() -> Result<Self> {
        Self::from_layers(&ConfigLayers::discover())
    }

    /// Resolve from explicit layers and validate.
    pub fn from_layers(layers: &ConfigLayers) -> Result<Self> {
        let text = |key: &Key| layers.lookup(key).unwrap_or_default().to_string();

        let timezone = layers
            .lookup(&keys::TIMEZONE)
            .or_else(|| layers.env_var(keys::TZ_ENV))
            .map(str::to_string);

        let config = Self {
            token: text(&keys::TOKEN),
            chat_id: text(&keys::CHAT_ID),
            note: text(&keys::NOTE),
            always_include_output: layers
                .lookup(&keys::ALWAYS)
                .map_or(DEFAULT_ALWAYS_INCLUDE_OUTPUT, parse_bool),
            parse_mode: parse_mode(layers),
            timeout: seconds(layers, &keys::TIMEOUT, DEFAULT_TIMEOUT),
            retries: retries(layers),
            backoff: seconds(layers, &keys::BACKOFF, DEFAULT_BACKOFF),
            strict: layers.lookup(&keys::STRICT).is_some_and(parse_bool),
            timezone,
            debug: layers.lookup(&keys::DEBUG).is_some_and(parse_bool),
            max_message_chars: max_chars(layers),
            api_base: layers
                .lookup(&keys::API_URL)
                .unwrap_or(TELEGRAM_API_BASE)
                .to_string(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on missing credentials.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() || self.chat_id.trim().is_empty() {
            return Err(Error::config("TOKEN/CHAT_ID not set (config or env)"));
        }
        Ok(())
    }

    /// First eight characters of the token, for diagnostics.
    pub fn token_hint(&self) -> &str {
        match self.token.char_indices().nth(8) {
            Some((idx, _)) => &self.token[..idx],
            None => &self.token,
        }
    }

    pub fn report_zone(&self) -> ReportZone {
        ReportZone::resolve(self.timezone.as_deref())
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            note: self.note.clone(),
            always_include_output: self.always_include_output,
            zone: self.report_zone(),
            max_chars: (self.max_message_chars > 0).then_some(self.max_message_chars),
        }
    }

    pub fn telegram_config(&self) -> TelegramConfig {
        TelegramConfig {
            bot_token: self.token.clone(),
            chat_id: self.chat_id.clone(),
            parse_mode: self.parse_mode.clone(),
            timeout: self.timeout,
            retries: self.retries,
            backoff: self.backoff,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("token", &format_args!("{}...", self.token_hint()))
            .field("chat_id", &self.chat_id)
            .field("note", &self.note)
            .field("always_include_output", &self.always_include_output)
            .field("parse_mode", &self.parse_mode)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("backoff", &self.backoff)
            .field("strict", &self.strict)
            .field("timezone", &self.timezone)
            .field("debug", &self.debug)
            .field("max_message_chars", &self.max_message_chars)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// `1`, `true`, `yes` and `on` are true; everything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Reports are composed as HTML; other modes are forwarded unchanged.
fn parse_mode(layers: &ConfigLayers) -> String {
    let mode = layers
        .lookup(&keys::PARSE_MODE)
        .unwrap_or(DEFAULT_PARSE_MODE);
    if !mode.eq_ignore_ascii_case(DEFAULT_PARSE_MODE) {
        warn!(
            key = keys::PARSE_MODE.env,
            value = %mode,
            "Reports are HTML-escaped, other parse modes may render incorrectly"
        );
    }
    mode.to_string()
}

fn seconds(layers: &ConfigLayers, key: &Key, default: Duration) -> Duration {
    let Some(raw) = layers.lookup(key) else {
        return default;
    };

    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!(key = key.env, value = %raw, default = ?default, "Invalid duration, using default");
            default
        }
    }
}

fn retries(layers: &ConfigLayers) -> u32 {
    let Some(raw) = layers.lookup(&keys::RETRIES) else {
        return DEFAULT_RETRIES;
    };

    match raw.trim().parse::<i64>() {
        Ok(n) => u32::try_from(n.max(0)).unwrap_or(u32::MAX),
        Err(_) => {
            warn!(key = keys::RETRIES.env, value = %raw, "Invalid retry count, using default");
            DEFAULT_RETRIES
        }
    }
}

fn max_chars(layers: &ConfigLayers) -> usize {
    let Some(raw) = layers.lookup(&keys::MAX_CHARS) else {
        return DEFAULT_MAX_MESSAGE_CHARS;
    };

    raw.trim().parse::<usize>().unwrap_or_else(|_| {
        warn!(key = keys::MAX_CHARS.env, value = %raw, "Invalid length limit, using default");
        DEFAULT_MAX_MESSAGE_CHARS
    })
}
