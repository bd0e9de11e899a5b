//! Cores and their composition
//!
//! A core pairs an encoder, a writer set and a level filter. Cores are
//! combined into a [`Tee`] that hands each entry to every core admitting
//! its level, exactly once per core.

use super::appender::Appender;
use super::encoder::Encoder;
use super::error::Result;
use super::level_filter::LevelFilter;
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use parking_lot::Mutex;
use std::sync::Arc;

/// A sink for log entries with its own admission rule
pub trait Core: Send + Sync {
    fn enabled(&self, level: LogLevel) -> bool;

    /// Write an admitted entry; callers check `enabled` first
    fn write(&self, entry: &LogEntry) -> Result<()>;

    /// Flush everything buffered below this core
    fn sync(&self) -> Result<()>;
}

pub type SharedAppender = Arc<Mutex<Box<dyn Appender>>>;

/// Ordered destinations receiving the entries admitted by one filter
#[derive(Clone, Default)]
pub struct WriterSet {
    appenders: Vec<SharedAppender>,
}

impl WriterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<A: Appender + 'static>(&mut self, appender: A) {
        self.appenders.push(Arc::new(Mutex::new(Box::new(appender))));
    }

    /// Add a destination that is also part of another writer set
    pub fn push_shared(&mut self, appender: SharedAppender) {
        self.appenders.push(appender);
    }

    pub fn is_empty(&self) -> bool {
        self.appenders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.appenders.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.appenders
            .iter()
            .map(|a| a.lock().name().to_string())
            .collect()
    }

    /// Encode once per rendering and write the record to every destination
    ///
    /// **Per-Appender Isolation**: a destination that errors or panics does
    /// not keep the record from the others. The first error is returned
    /// after all destinations were tried.
    pub fn write(&self, encoder: &Encoder, entry: &LogEntry) -> Result<()> {
        let mut plain: Option<String> = None;
        let mut colored: Option<String> = None;
        let mut first_error = None;

        for appender in &self.appenders {
            let mut guard = appender.lock();
            let record = if guard.colorize() {
                colored.get_or_insert_with(|| encoder.encode(entry, true))
            } else {
                plain.get_or_insert_with(|| encoder.encode(entry, false))
            };

            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                guard.append(record.as_bytes())
            }));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Appender '{}' failed: {}", guard.name(), e);
                    first_error.get_or_insert(e);
                }
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    eprintln!(
                        "[LOGGER CRITICAL] Appender '{}' panicked: {}. \
                         Other appenders continue to function.",
                        guard.name(),
                        panic_msg
                    );
                    first_error.get_or_insert(super::error::LoggerError::other(format!(
                        "appender '{}' panicked: {}",
                        guard.name(),
                        panic_msg
                    )));
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for appender in &self.appenders {
            let mut guard = appender.lock();
            if let Err(e) = guard.flush() {
                eprintln!("[LOGGER ERROR] Appender '{}' flush failed: {}", guard.name(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Encoder + writer set + level filter
pub struct IoCore {
    encoder: Encoder,
    writers: WriterSet,
    filter: LevelFilter,
}

impl IoCore {
    pub fn new(encoder: Encoder, writers: WriterSet, filter: LevelFilter) -> Self {
        Self {
            encoder,
            writers,
            filter,
        }
    }

    pub fn filter(&self) -> LevelFilter {
        self.filter
    }

    pub fn writers(&self) -> &WriterSet {
        &self.writers
    }
}

impl Core for IoCore {
    fn enabled(&self, level: LogLevel) -> bool {
        self.filter.enabled(level)
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        self.writers.write(&self.encoder, entry)
    }

    fn sync(&self) -> Result<()> {
        self.writers.flush()
    }
}

/// Fan-out over several cores
#[derive(Clone, Default)]
pub struct Tee {
    cores: Vec<Arc<dyn Core>>,
}

impl Tee {
    pub fn new(cores: Vec<Arc<dyn Core>>) -> Self {
        Self { cores }
    }

    pub fn push(&mut self, core: Arc<dyn Core>) {
        self.cores.push(core);
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }
}

impl Core for Tee {
    fn enabled(&self, level: LogLevel) -> bool {
        self.cores.iter().any(|c| c.enabled(level))
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let mut first_error = None;
        for core in self.cores.iter().filter(|c| c.enabled(entry.level)) {
            if let Err(e) = core.write(entry) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn sync(&self) -> Result<()> {
        let mut first_error = None;
        for core in &self.cores {
            if let Err(e) = core.sync() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
