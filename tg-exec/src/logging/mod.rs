//! Diagnostic logging.
//!
//! Events go to stderr so they never mix with the wrapped command's
//! stdout. The filter starts at [`DEFAULT_LOG_FILTER`] (or `RUST_LOG`) and
//! can be raised to debug once the configuration is known.

use chrono::Local;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
};

use crate::{Error, Result};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "tg_exec=warn,process_utils=warn";

/// Filter used when the debug flag is set.
pub const DEBUG_LOG_FILTER: &str = "tg_exec=debug,process_utils=debug";

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Type alias for the reload handle.
pub type FilterHandle = Handle<EnvFilter, tracing_subscriber::Registry>;

/// Handle to the installed subscriber.
pub struct LoggingConfig {
    handle: FilterHandle,
    /// `RUST_LOG` was set; leave the user's filter alone.
    env_override: bool,
}

impl LoggingConfig {
    /// Switch to [`DEBUG_LOG_FILTER`] unless `RUST_LOG` is in charge.
    pub fn enable_debug(&self) -> Result<()> {
        if self.env_override {
            return Ok(());
        }
        self.set_filter(DEBUG_LOG_FILTER)
    }

    /// Replace the active filter.
    pub fn set_filter(&self, directive: &str) -> Result<()> {
        let filter = EnvFilter::try_new(directive)
            .map_err(|e| Error::Other(format!("Invalid log filter '{directive}': {e}")))?;
        self.handle
            .reload(filter)
            .map_err(|e| Error::Other(format!("Failed to reload log filter: {e}")))
    }
}

/// Install the global subscriber.
pub fn init_logging() -> Result<LoggingConfig> {
    let (filter, env_override) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(DEFAULT_LOG_FILTER), false),
    };
    let (filter_layer, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimer)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to install logger: {e}")))?;

    Ok(LoggingConfig {
        handle,
        env_override,
    })
}
