//! Log entry structure

use super::field::Field;
use super::log_level::LogLevel;
use chrono::{DateTime, Local};
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

/// Source location of a log call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: Cow<'static, str>,
    pub line: u32,
}

impl Caller {
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }

    /// `file:line` with the full path
    pub fn full(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }

    /// `dir/file:line`, keeping only the last directory
    pub fn short(&self) -> String {
        let path = self.file.replace('\\', "/");
        let mut parts = path.rsplitn(3, '/');
        let file = parts.next().unwrap_or_default();
        match parts.next() {
            Some(dir) => format!("{}/{}:{}", dir, file, self.line),
            None => format!("{}:{}", file, self.line),
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
    pub logger_name: Option<String>,
    pub caller: Option<Caller>,
    pub stacktrace: Option<String>,
    pub fields: Vec<Field>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Local::now(),
            logger_name: None,
            caller: None,
            stacktrace: None,
            fields: Vec::new(),
        }
    }

    /// Message with newlines, carriage returns and tabs escaped
    ///
    /// Line-oriented encodings use this so an attacker-controlled message
    /// cannot inject fake entries.
    pub fn sanitized_message(&self) -> Cow<'_, str> {
        if self.message.contains(['\n', '\r', '\t']) {
            Cow::Owned(
                self.message
                    .replace('\n', "\\n")
                    .replace('\r', "\\r")
                    .replace('\t', "\\t"),
            )
        } else {
            Cow::Borrowed(&self.message)
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    #[must_use]
    pub fn with_stacktrace(mut self, stacktrace: String) -> Self {
        self.stacktrace = Some(stacktrace);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::with;

    #[test]
    fn test_message_is_sanitized() {
        let entry = LogEntry::new(LogLevel::Info, "line one\nline two\tend");
        assert_eq!(entry.sanitized_message(), "line one\\nline two\\tend");
        assert_eq!(entry.message, "line one\nline two\tend");
    }

    #[test]
    fn test_caller_renderings() {
        let caller = Caller::new("src/server/handler.rs", 42);
        assert_eq!(caller.full(), "src/server/handler.rs:42");
        assert_eq!(caller.short(), "server/handler.rs:42");

        let bare = Caller::new("main.rs", 7);
        assert_eq!(bare.short(), "main.rs:7");
    }

    #[test]
    fn test_builder_methods() {
        let entry = LogEntry::new(LogLevel::Error, "failed")
            .with_logger_name("db")
            .with_fields(vec![with("retry", 3)]);

        assert_eq!(entry.logger_name.as_deref(), Some("db"));
        assert_eq!(entry.fields.len(), 1);
        assert!(entry.caller.is_none());
    }
}
