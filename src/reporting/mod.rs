//! Remote error reporting
//!
//! Entries at error severity and above are mirrored to a Sentry-compatible
//! service. The [`ReportingCore`] plugs into the logger's tee next to the
//! file and console cores; delivery happens on a background worker so a slow
//! or unreachable service never holds up the logging call.

pub mod dsn;
pub mod sentry;

pub use dsn::Dsn;
pub use sentry::{ReporterOptions, SentryReporter, DEFAULT_QUEUE_CAPACITY};

use crate::core::error::{LoggerError, Result};
use crate::core::field::field_key;
use crate::core::log_entry::LogEntry;
use crate::core::log_level::LogLevel;
use crate::core::stacktrace;
use crate::core::tee::Core;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Lowest severity forwarded to the remote service
pub const REPORT_THRESHOLD: LogLevel = LogLevel::Error;

/// How long `sync` waits for queued reports to be delivered
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// `extra` keys filled from the entry itself
const EXTRA_RESERVED_KEYS: &[&str] = &["file", "stacktrace"];

/// Destination for error reports
pub trait RemoteReporter: Send + Sync {
    /// Hand over an event; must not block on delivery
    fn report(&self, event: ReportEvent);

    /// Wait until queued events were delivered; `false` on timeout
    fn flush(&self, timeout: Duration) -> bool;
}

/// One event as sent to the service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub platform: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ReportEvent {
    pub fn from_entry(entry: &LogEntry) -> Self {
        let mut extra = serde_json::Map::new();
        if let Some(caller) = &entry.caller {
            extra.insert("file".to_string(), serde_json::Value::String(caller.full()));
        }
        if let Some(stack) = &entry.stacktrace {
            extra.insert(
                "stacktrace".to_string(),
                serde_json::Value::String(stack.clone()),
            );
        }
        for field in &entry.fields {
            extra.insert(
                field_key(&field.key, EXTRA_RESERVED_KEYS).into_owned(),
                field.value.to_json_value(),
            );
        }

        Self {
            event_id: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: entry.timestamp.with_timezone(&Utc),
            level: entry.level,
            platform: "other",
            logger: entry.logger_name.clone(),
            message: entry.message.clone(),
            environment: None,
            tags: BTreeMap::new(),
            extra,
        }
    }

    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }
}

/// Core forwarding error-and-above entries to a [`RemoteReporter`]
pub struct ReportingCore {
    reporter: Arc<dyn RemoteReporter>,
    environment: Option<String>,
    tags: BTreeMap<String, String>,
    attach_stacktrace: bool,
    skip_frames: usize,
}

impl ReportingCore {
    pub fn new(reporter: Arc<dyn RemoteReporter>) -> Self {
        Self {
            reporter,
            environment: None,
            tags: BTreeMap::new(),
            attach_stacktrace: false,
            skip_frames: 0,
        }
    }

    #[must_use]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        let environment = environment.into();
        self.environment = (!environment.is_empty()).then_some(environment);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Capture a stacktrace for entries that don't carry one already
    #[must_use]
    pub fn attach_stacktrace(mut self, enabled: bool, skip_frames: usize) -> Self {
        self.attach_stacktrace = enabled;
        self.skip_frames = skip_frames;
        self
    }

    fn event_for(&self, entry: &LogEntry) -> ReportEvent {
        let mut event = ReportEvent::from_entry(entry);
        event.environment = self.environment.clone();
        event.tags = self.tags.clone();

        if self.attach_stacktrace && entry.stacktrace.is_none() {
            event.extra.insert(
                "stacktrace".to_string(),
                serde_json::Value::String(stacktrace::capture(self.skip_frames)),
            );
        } else if !self.attach_stacktrace {
            event.extra.remove("stacktrace");
        }
        event
    }
}

impl Core for ReportingCore {
    fn enabled(&self, level: LogLevel) -> bool {
        level >= REPORT_THRESHOLD
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        self.reporter.report(self.event_for(entry));
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        if self.reporter.flush(DEFAULT_FLUSH_TIMEOUT) {
            Ok(())
        } else {
            Err(LoggerError::reporter(format!(
                "pending reports not delivered within {:?}",
                DEFAULT_FLUSH_TIMEOUT
            )))
        }
    }
}
