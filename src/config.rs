//! Logger configuration
//!
//! [`LoggerConfig`] carries every option the builder understands. It can be
//! filled in code, through [`LoggerBuilder`](crate::LoggerBuilder) setters, or
//! loaded from a TOML, YAML or JSON file. Keys missing from a file keep their
//! defaults.
//!
//! ```toml
//! encoding = "json"
//! division = "time"
//! time_unit = "day"
//! info_filename = "./logs/server.log"
//! error_filename = "./logs/server_err.log"
//! level_separate = true
//! level = -1
//! max_age = 7
//!
//! [sentry_config]
//! dsn = "https://key@sentry.example.com/2"
//! environment = "dev"
//! tags = { source = "demo" }
//! ```

use crate::appenders::{RotationStrategy, SizeRotationPolicy, TimeUnit};
use crate::core::encoder::{CallerFormat, EncoderConfig, Encoding};
use crate::core::error::{LoggerError, Result};
use crate::core::log_level::LogLevel;
use crate::core::timestamp::TimestampFormat;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// How file output is split over several files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    /// One file per period of the configured [`TimeUnit`]
    Time,
    /// Numbered backups once the file reaches `max_size` MB
    #[default]
    Size,
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Division::Time => "time",
            Division::Size => "size",
        })
    }
}

impl FromStr for Division {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "time" => Ok(Division::Time),
            "size" => Ok(Division::Size),
            other => Err(LoggerError::config(
                "division",
                format!("expected 'time' or 'size', got '{}'", other),
            )),
        }
    }
}

/// Remote error reporting options; an empty DSN disables reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentryConfig {
    pub dsn: String,
    pub debug: bool,
    pub attach_stacktrace: bool,
    pub environment: String,
    pub tags: BTreeMap<String, String>,
    pub sample_rate: f64,
    pub queue_capacity: usize,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            debug: false,
            attach_stacktrace: false,
            environment: String::new(),
            tags: BTreeMap::new(),
            sample_rate: 1.0,
            queue_capacity: crate::reporting::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl SentryConfig {
    pub fn is_enabled(&self) -> bool {
        !self.dsn.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub encoding: Encoding,
    pub division: Division,
    pub time_unit: TimeUnit,
    /// File for all admitted entries, or only those below warn when split
    pub info_filename: String,
    /// File for warn and above; used only with `level_separate`
    pub error_filename: String,
    /// Megabytes before size rotation; 0 means 100
    pub max_size: u64,
    /// Rotated files kept; 0 keeps all
    pub max_backups: usize,
    /// Days rotated files are kept; 0 keeps them forever
    pub max_age: u32,
    pub compress: bool,
    pub level_separate: bool,
    pub level: LogLevel,
    #[serde(deserialize_with = "deserialize_flag")]
    pub close_display: bool,
    /// Attach stacktraces to warn and above
    pub stacktrace: bool,
    pub sentry_config: SentryConfig,
    pub time_key: String,
    pub level_key: String,
    pub time_format: TimestampFormat,
    pub short_caller: bool,
    pub caller: bool,
    pub caller_skip: usize,
    pub name: Option<String>,
    /// Build a logger even when no destination is active
    pub allow_discard: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            division: Division::default(),
            time_unit: TimeUnit::default(),
            info_filename: String::new(),
            error_filename: String::new(),
            max_size: 0,
            max_backups: 0,
            max_age: 0,
            compress: false,
            level_separate: false,
            level: LogLevel::default(),
            close_display: false,
            stacktrace: false,
            sentry_config: SentryConfig::default(),
            time_key: "time".to_string(),
            level_key: "level".to_string(),
            time_format: TimestampFormat::default(),
            short_caller: false,
            caller: false,
            caller_skip: 0,
            name: None,
            allow_discard: false,
        }
    }
}

impl LoggerConfig {
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid TOML
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(toml::from_str(&read_config(path.as_ref())?)?)
    }

    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid YAML
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(serde_yaml::from_str(&read_config(path.as_ref())?)?)
    }

    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid JSON
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(serde_json::from_str(&read_config(path.as_ref())?)?)
    }

    /// Load a file, choosing the format from its extension
    ///
    /// # Errors
    ///
    /// Returns error for unknown extensions or when loading fails
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(LoggerError::config(
                "config file",
                format!(
                    "cannot infer format of '{}'; expected .toml, .yaml, .yml or .json",
                    path.display()
                ),
            )),
        }
    }

    /// Check values serde cannot constrain
    ///
    /// # Errors
    ///
    /// Returns error naming the first offending key
    pub fn validate(&self) -> Result<()> {
        let rate = self.sentry_config.sample_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(LoggerError::config(
                "sentry_config.sample_rate",
                format!("must be within 0.0..=1.0, got {}", rate),
            ));
        }
        if let TimestampFormat::Custom(pattern) = &self.time_format {
            if pattern.is_empty() {
                return Err(LoggerError::config("time_format", "custom pattern is empty"));
            }
        }
        Ok(())
    }

    /// Whether entries below warn go to a different file than the rest
    pub fn splits_files(&self) -> bool {
        self.level_separate && !self.error_filename.is_empty()
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            time_key: self.time_key.clone(),
            level_key: self.level_key.clone(),
            timestamp_format: self.time_format.clone(),
            caller_format: if self.short_caller {
                CallerFormat::Short
            } else {
                CallerFormat::Full
            },
            ..EncoderConfig::default()
        }
    }

    pub fn rotation_strategy(&self) -> RotationStrategy {
        match self.division {
            Division::Time => RotationStrategy::Time {
                unit: self.time_unit,
                max_age_days: self.max_age,
            },
            Division::Size => RotationStrategy::Size(
                SizeRotationPolicy::from_megabytes(self.max_size)
                    .with_max_backups(self.max_backups)
                    .with_max_age_days(self.max_age)
                    .with_compression(self.compress),
            ),
        }
    }
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        LoggerError::io_operation(
            "reading config file",
            format!("cannot read '{}'", path.display()),
            e,
        )
    })
}

/// Accept `close_display = 1` as well as `close_display = true`
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}
