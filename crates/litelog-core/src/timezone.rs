//! Timezone handling for rendered timestamps
//!
//! Log timestamps arrive in UTC. They are shown in the operator's local
//! timezone unless `--utc` or `--timezone` say otherwise.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use tracing::debug;

use crate::error::{LitelogError, Result};

/// Configuration for timezone handling
#[derive(Debug, Clone)]
pub struct TimezoneConfig {
    /// The timezone timestamps are rendered in
    pub tz: Tz,
    /// Whether the timezone is UTC
    pub is_utc: bool,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        let tz = get_local_timezone();
        Self {
            is_utc: tz == Tz::UTC,
            tz,
        }
    }
}

impl TimezoneConfig {
    /// Create a timezone configuration from CLI arguments
    pub fn from_cli(timezone_str: Option<&str>, use_utc: bool) -> Result<Self> {
        if use_utc {
            return Ok(Self::utc());
        }

        match timezone_str {
            Some(tz_str) => {
                let tz = Tz::from_str(tz_str).map_err(|_| {
                    LitelogError::InvalidTimezone(format!(
                        "'{tz_str}'. Use format like 'America/New_York', 'Asia/Shanghai', or 'UTC'"
                    ))
                })?;
                Ok(Self {
                    tz,
                    is_utc: tz == Tz::UTC,
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// UTC configuration
    pub fn utc() -> Self {
        Self {
            tz: Tz::UTC,
            is_utc: true,
        }
    }

    /// Get the display name for the configured timezone
    pub fn display_name(&self) -> &str {
        if self.is_utc { "UTC" } else { self.tz.name() }
    }

    /// Render an instant in this timezone
    pub fn format(&self, dt: &DateTime<Utc>, fmt: &str) -> String {
        dt.with_timezone(&self.tz).format(fmt).to_string()
    }
}

/// Detect the system's local timezone
///
/// `TZ` wins over the platform setting; anything unparseable falls back to UTC.
pub fn get_local_timezone() -> Tz {
    if let Ok(tz_str) = std::env::var("TZ")
        && let Ok(tz) = Tz::from_str(&tz_str)
    {
        debug!("Using timezone from TZ environment variable: {}", tz_str);
        return tz;
    }

    match iana_time_zone::get_timezone() {
        Ok(tz_str) => Tz::from_str(&tz_str).unwrap_or_else(|_| {
            debug!("Could not parse system timezone '{}', using UTC", tz_str);
            Tz::UTC
        }),
        Err(e) => {
            debug!("Could not detect local timezone: {:?}, using UTC", e);
            Tz::UTC
        }
    }
}
