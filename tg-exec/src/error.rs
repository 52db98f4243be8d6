//! Application-wide error types.

use std::time::Duration;

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status for missing credentials or a missing command.
pub const EXIT_USAGE: i32 = 2;

/// Exit status used in strict mode when the report could not be delivered.
pub const EXIT_DELIVERY_FAILED: i32 = 70;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Process exit status this error maps to when it aborts the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => EXIT_USAGE,
            Self::Delivery(_) => EXIT_DELIVERY_FAILED,
            Self::Io(_) | Self::Other(_) => 1,
        }
    }
}

/// Failure of a single delivery attempt, or of the whole retry loop.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("http {status}: {description}")]
    Rejected { status: u16, description: String },

    #[error("gave up after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<DeliveryError>,
    },
}

impl DeliveryError {
    /// The cause of the last attempt, unwrapping [`DeliveryError::Exhausted`].
    pub fn last_cause(&self) -> &DeliveryError {
        match self {
            Self::Exhausted { source, .. } => source.last_cause(),
            other => other,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
