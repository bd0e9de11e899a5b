//! Core logger types and traits

pub mod appender;
pub mod encoder;
pub mod error;
pub mod field;
pub mod level_filter;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod stacktrace;
pub mod tee;
pub mod timestamp;

pub use appender::Appender;
pub use encoder::{CallerFormat, Encoder, EncoderConfig, Encoding};
pub use error::{LoggerError, Result};
pub use field::{with, with_error, with_serde, Field, FieldValue};
pub use level_filter::{LevelFilter, WARN_THRESHOLD};
pub use log_entry::{Caller, LogEntry};
pub use log_level::LogLevel;
pub use logger::{FatalHook, Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use tee::{Core, IoCore, SharedAppender, Tee, WriterSet};
pub use timestamp::TimestampFormat;
