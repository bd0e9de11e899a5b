//! Entry encoders
//!
//! Renders a [`LogEntry`] into one output record:
//! - Json: one JSON object per line, for machine processing
//! - Console: tab separated, human-readable, optionally colorized level

use super::field::field_key;
use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;
use colored::Colorize;
use serde::{Deserialize, Serialize};

/// Output encoding for log records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Single-line JSON object per entry
    ///
    /// Example: `{"time":"2025-01-08T10:30:45.123+0000","level":"info","msg":"Request processed"}`
    Json,

    /// Human-readable, tab separated (default)
    ///
    /// Example: `2025-01-08T10:30:45.123+0000	info	Request processed	{"user":"alice"}`
    #[default]
    Console,
}

/// How the caller location is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerFormat {
    /// Full path as recorded by the compiler
    #[default]
    Full,
    /// Last directory and file name only
    Short,
}

/// Keys and renderings shared by both encodings
///
/// An empty key omits that element from the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub time_key: String,
    pub level_key: String,
    pub name_key: String,
    pub caller_key: String,
    pub message_key: String,
    pub stacktrace_key: String,
    pub timestamp_format: TimestampFormat,
    pub caller_format: CallerFormat,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            time_key: "time".to_string(),
            level_key: "level".to_string(),
            name_key: "logger".to_string(),
            caller_key: "file".to_string(),
            message_key: "msg".to_string(),
            stacktrace_key: "stacktrace".to_string(),
            timestamp_format: TimestampFormat::default(),
            caller_format: CallerFormat::default(),
        }
    }
}

/// Formatter for one encoding
#[derive(Debug, Clone)]
pub struct Encoder {
    encoding: Encoding,
    config: EncoderConfig,
}

impl Encoder {
    pub fn new(encoding: Encoding, config: EncoderConfig) -> Self {
        Self { encoding, config }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode an entry as a newline terminated record
    ///
    /// `colorize` only affects the console encoding's level.
    pub fn encode(&self, entry: &LogEntry, colorize: bool) -> String {
        let mut record = match self.encoding {
            Encoding::Json => self.encode_json(entry),
            Encoding::Console => self.encode_console(entry, colorize),
        };
        record.push('\n');
        record
    }

    fn caller(&self, entry: &LogEntry) -> Option<String> {
        entry.caller.as_ref().map(|caller| match self.config.caller_format {
            CallerFormat::Full => caller.full(),
            CallerFormat::Short => caller.short(),
        })
    }

    /// Keys of the entry's own elements, which fields may not replace
    fn reserved_keys(&self) -> Vec<&str> {
        let cfg = &self.config;
        [
            &cfg.time_key,
            &cfg.level_key,
            &cfg.name_key,
            &cfg.caller_key,
            &cfg.message_key,
            &cfg.stacktrace_key,
        ]
        .into_iter()
        .map(String::as_str)
        .filter(|key| !key.is_empty())
        .collect()
    }

    fn encode_json(&self, entry: &LogEntry) -> String {
        let cfg = &self.config;
        let mut json_obj = serde_json::Map::new();

        if !cfg.time_key.is_empty() {
            json_obj.insert(
                cfg.time_key.clone(),
                serde_json::Value::String(cfg.timestamp_format.format(&entry.timestamp)),
            );
        }
        if !cfg.level_key.is_empty() {
            json_obj.insert(
                cfg.level_key.clone(),
                serde_json::Value::String(entry.level.as_str().to_string()),
            );
        }
        if let (false, Some(name)) = (cfg.name_key.is_empty(), &entry.logger_name) {
            json_obj.insert(cfg.name_key.clone(), serde_json::Value::String(name.clone()));
        }
        if let (false, Some(caller)) = (cfg.caller_key.is_empty(), self.caller(entry)) {
            json_obj.insert(cfg.caller_key.clone(), serde_json::Value::String(caller));
        }
        if !cfg.message_key.is_empty() {
            json_obj.insert(
                cfg.message_key.clone(),
                serde_json::Value::String(entry.message.clone()),
            );
        }

        let reserved = self.reserved_keys();
        for field in &entry.fields {
            json_obj.insert(
                field_key(&field.key, &reserved).into_owned(),
                field.value.to_json_value(),
            );
        }

        if let (false, Some(stack)) = (cfg.stacktrace_key.is_empty(), &entry.stacktrace) {
            json_obj.insert(
                cfg.stacktrace_key.clone(),
                serde_json::Value::String(stack.clone()),
            );
        }

        serde_json::to_string(&serde_json::Value::Object(json_obj)).unwrap_or_default()
    }

    fn encode_console(&self, entry: &LogEntry, colorize: bool) -> String {
        let cfg = &self.config;
        let mut parts: Vec<String> = Vec::with_capacity(6);

        if !cfg.time_key.is_empty() {
            parts.push(cfg.timestamp_format.format(&entry.timestamp));
        }
        if !cfg.level_key.is_empty() {
            let level = entry.level.as_str();
            if colorize {
                parts.push(level.color(entry.level.color()).to_string());
            } else {
                parts.push(level.to_string());
            }
        }
        if let (false, Some(name)) = (cfg.name_key.is_empty(), &entry.logger_name) {
            parts.push(name.clone());
        }
        if let (false, Some(caller)) = (cfg.caller_key.is_empty(), self.caller(entry)) {
            parts.push(caller);
        }
        if !cfg.message_key.is_empty() {
            parts.push(entry.sanitized_message().into_owned());
        }

        if !entry.fields.is_empty() {
            let fields: serde_json::Map<String, serde_json::Value> = entry
                .fields
                .iter()
                .map(|f| (f.key.clone(), f.value.to_json_value()))
                .collect();
            parts.push(serde_json::Value::Object(fields).to_string());
        }

        let mut line = parts.join("\t");

        // Stacktraces are multi-line by nature and follow the entry line
        if let (false, Some(stack)) = (cfg.stacktrace_key.is_empty(), &entry.stacktrace) {
            line.push('\n');
            line.push_str(stack.trim_end());
        }

        line
    }
}
