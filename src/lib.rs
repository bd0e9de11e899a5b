//! # teelog
//!
//! A configuration-driven structured logger. One [`LoggerConfig`] decides
//! the encoding, the destinations and how files rotate; the resulting
//! [`Logger`] fans each entry out to every destination whose level filter
//! admits it.
//!
//! ## Features
//!
//! - **Two encodings**: one JSON object per line, or tab separated console
//!   lines with a colorized level on terminals
//! - **Level separation**: entries below warn go to the info file, warn and
//!   above to the error file
//! - **Rotation**: by size with numbered, optionally gzipped backups, or by
//!   time with one file per minute, hour, day, month or year
//! - **Remote reporting**: error-and-above entries mirrored to a
//!   Sentry-compatible service from a background worker
//! - **Config files**: TOML, YAML or JSON
//!
//! ## Example
//!
//! ```no_run
//! use teelog::prelude::*;
//!
//! let config = LoggerConfig::from_path("configs/config.yaml")?;
//! let logger = LoggerBuilder::from_config(config)
//!     .caller(true, 0)
//!     .short_caller(true)
//!     .build()?;
//!
//! logger.info("info level test", &[]);
//! logger.error("error message", &[with("foo", "bar")]);
//! # Ok::<(), teelog::LoggerError>(())
//! ```

pub mod appenders;
pub mod config;
pub mod core;
pub mod macros;
pub mod reporting;

pub mod prelude {
    pub use crate::appenders::{RotationStrategy, SizeRotationPolicy, TimeUnit};
    pub use crate::config::{Division, LoggerConfig, SentryConfig};
    pub use crate::core::{
        with, with_error, with_serde, Appender, Encoding, FatalHook, Field, FieldValue, LogLevel,
        Logger, LoggerBuilder, LoggerError, LoggerMetrics, Result, TimestampFormat,
    };
}

pub use crate::appenders::{
    ConsoleAppender, RotatingFileAppender, RotationStrategy, SizeRotationPolicy,
    TimeRotatingFileAppender, TimeUnit,
};
pub use crate::config::{Division, LoggerConfig, SentryConfig};
pub use crate::core::{
    with, with_error, with_serde, Appender, CallerFormat, Encoding, FatalHook, Field, FieldValue,
    LevelFilter, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics, Result,
    TimestampFormat,
};
pub use crate::reporting::{RemoteReporter, ReportEvent};
