//! Timestamp formatting utilities
//!
//! Provides the timestamp renderings used by the encoders: a machine
//! parseable ISO 8601 form, the fixed `YYYY-MM-DD HH:MM:SS` form and
//! arbitrary strftime patterns.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use teelog::TimestampFormat;
/// use chrono::{Local, TimeZone};
///
/// let at = Local.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::DateTime.format(&at), "2025-01-08 10:30:45");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds and offset: `2025-01-08T10:30:45.123+0800`
    #[default]
    Iso8601,

    /// Fixed `2025-01-08 10:30:45`
    #[serde(alias = "datetime")]
    DateTime,

    /// Custom strftime format
    ///
    /// # Examples
    ///
    /// ```
    /// use teelog::TimestampFormat;
    ///
    /// // Apache log format
    /// let format = TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S %z".to_string());
    /// ```
    Custom(String),
}

impl TimestampFormat {
    /// Format a timestamp in any timezone according to this format
    #[must_use]
    pub fn format<Tz: TimeZone>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string(),
            TimestampFormat::DateTime => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }
}
