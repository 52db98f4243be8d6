//! Zone used to render report timestamps.

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Timestamp layout used in reports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Either a named IANA zone or the machine's local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportZone {
    Named(Tz),
    #[default]
    Local,
}

impl ReportZone {
    /// Parse an IANA zone name, falling back to the local zone.
    pub fn resolve(name: Option<&str>) -> Self {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Self::Local;
        };

        match name.parse::<Tz>() {
            Ok(tz) => Self::Named(tz),
            Err(_) => {
                warn!(timezone = %name, "Unknown timezone, using local time");
                Self::Local
            }
        }
    }

    /// Render `instant` in this zone.
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        match self {
            Self::Named(tz) => instant.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
            Self::Local => instant
                .with_timezone(&Local)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
        }
    }
}
