//! Logger construction and the logging facade

use super::{
    appender::Appender,
    encoder::{Encoder, Encoding},
    error::{LoggerError, Result},
    field::Field,
    level_filter::LevelFilter,
    log_entry::{Caller, LogEntry},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    stacktrace,
    tee::{Core, IoCore, SharedAppender, Tee, WriterSet},
    timestamp::TimestampFormat,
};
use crate::appenders::{ConsoleAppender, TimeUnit};
use crate::config::{Division, LoggerConfig, SentryConfig};
use crate::reporting::{
    Dsn, RemoteReporter, ReporterOptions, ReportingCore, SentryReporter,
};
use parking_lot::Mutex;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// What `fatal` does after the entry is written and flushed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FatalHook {
    /// Terminate the process with exit code 1
    #[default]
    Exit,
    /// Panic with the entry's message
    Panic,
    /// Return to the caller
    Noop,
}

struct Shared {
    core: Tee,
    metrics: Arc<LoggerMetrics>,
    add_caller: bool,
    stacktrace: bool,
    caller_skip: usize,
    fatal_hook: FatalHook,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Err(e) = self.core.sync() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let dropped = self.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} dropped logs (drop rate: {:.2}%)",
                dropped,
                self.metrics.drop_rate()
            );
        }
    }
}

/// Structured, leveled logger
///
/// Cloning is cheap; clones share destinations and metrics. Child loggers
/// from [`named`](Logger::named) and [`with_fields`](Logger::with_fields)
/// share them too.
///
/// # Example
///
/// ```no_run
/// use teelog::prelude::*;
///
/// let logger = Logger::builder()
///     .info_file("./logs/server.log")
///     .error_file("./logs/server_err.log")
///     .encoding(Encoding::Json)
///     .build()
///     .unwrap();
///
/// logger.info("server started", &[with("port", 8080)]);
/// logger.error("request failed", &[with("foo", "bar")]);
/// ```
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    name: Option<String>,
    fields: Arc<Vec<Field>>,
}

impl Logger {
    /// Create a builder with default configuration
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Build a logger straight from a configuration
    ///
    /// # Errors
    ///
    /// See [`LoggerBuilder::build`]
    pub fn from_config(config: LoggerConfig) -> Result<Self> {
        LoggerBuilder::from_config(config).build()
    }

    /// Whether an entry at `level` reaches any destination
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.shared.core.enabled(level)
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>, fields: &[Field]) {
        self.emit(level, message.into(), fields, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, fields: &[Field]) {
        self.emit(LogLevel::Debug, message.into(), fields, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>, fields: &[Field]) {
        self.emit(LogLevel::Info, message.into(), fields, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>, fields: &[Field]) {
        self.emit(LogLevel::Warn, message.into(), fields, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>, fields: &[Field]) {
        self.emit(LogLevel::Error, message.into(), fields, Location::caller());
    }

    /// Log at fatal level, flush every destination, then run the fatal hook
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>, fields: &[Field]) {
        let message = message.into();
        self.emit(LogLevel::Fatal, message.clone(), fields, Location::caller());
        self.terminate(&message);
    }

    #[track_caller]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.emit(LogLevel::Debug, args.to_string(), &[], Location::caller());
    }

    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.emit(LogLevel::Info, args.to_string(), &[], Location::caller());
    }

    #[track_caller]
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.emit(LogLevel::Warn, args.to_string(), &[], Location::caller());
    }

    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.emit(LogLevel::Error, args.to_string(), &[], Location::caller());
    }

    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) {
        let message = args.to_string();
        self.emit(LogLevel::Fatal, message.clone(), &[], Location::caller());
        self.terminate(&message);
    }

    fn emit(
        &self,
        level: LogLevel,
        message: String,
        fields: &[Field],
        location: &'static Location<'static>,
    ) {
        let shared = &self.shared;
        if !shared.core.enabled(level) {
            return;
        }

        let mut entry = LogEntry::new(level, message)
            .with_fields(self.fields.iter().chain(fields.iter()).cloned());
        entry.logger_name = self.name.clone();
        if shared.add_caller {
            let resolved = match shared.caller_skip {
                0 => None,
                skip => stacktrace::caller(skip),
            };
            entry.caller = Some(resolved.unwrap_or_else(|| Caller::from_location(location)));
        }
        if shared.stacktrace && level >= LogLevel::Warn {
            entry.stacktrace = Some(stacktrace::capture(shared.caller_skip));
        }

        match shared.core.write(&entry) {
            Ok(()) => {
                shared.metrics.record_logged();
            }
            Err(_) => {
                // Destinations report their own failures on stderr
                shared.metrics.record_dropped();
            }
        }
    }

    fn terminate(&self, message: &str) {
        if let Err(e) = self.sync() {
            eprintln!("[LOGGER ERROR] Failed to flush before fatal exit: {}", e);
        }
        match self.shared.fatal_hook {
            FatalHook::Exit => std::process::exit(1),
            FatalHook::Panic => panic!("fatal: {}", message),
            FatalHook::Noop => {}
        }
    }

    /// Child logger whose name is this logger's name plus `.name`
    #[must_use]
    pub fn named(&self, name: &str) -> Logger {
        let name = match &self.name {
            Some(parent) if !name.is_empty() => format!("{}.{}", parent, name),
            Some(parent) => parent.clone(),
            None => name.to_string(),
        };
        Logger {
            shared: Arc::clone(&self.shared),
            name: (!name.is_empty()).then_some(name),
            fields: Arc::clone(&self.fields),
        }
    }

    /// Child logger adding `fields` to every entry
    #[must_use]
    pub fn with_fields(&self, fields: impl IntoIterator<Item = Field>) -> Logger {
        let mut all = self.fields.as_ref().clone();
        all.extend(fields);
        Logger {
            shared: Arc::clone(&self.shared),
            name: self.name.clone(),
            fields: Arc::new(all),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Flush every destination and wait for pending remote reports
    ///
    /// # Errors
    ///
    /// Returns the first failure; all destinations are flushed regardless
    pub fn sync(&self) -> Result<()> {
        self.shared.core.sync()
    }

    /// Write and drop counters shared by this logger and its children
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    pub fn dropped_count(&self) -> u64 {
        self.shared.metrics.dropped_count()
    }
}

/// Builder assembling a [`Logger`] from a [`LoggerConfig`]
///
/// # Example
/// ```no_run
/// use teelog::prelude::*;
///
/// let logger = Logger::builder()
///     .division(Division::Time)
///     .time_unit(TimeUnit::Minute)
///     .encoding(Encoding::Json)
///     .info_file("./logs/server.log")
///     .error_file("./logs/server_err.log")
///     .caller(true, 0)
///     .build()
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    appenders: Vec<Box<dyn Appender>>,
    reporter: Option<Arc<dyn RemoteReporter>>,
    fatal_hook: FatalHook,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::from_config(LoggerConfig::default())
    }

    pub fn from_config(config: LoggerConfig) -> Self {
        Self {
            config,
            appenders: Vec::new(),
            reporter: None,
            fatal_hook: FatalHook::default(),
        }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    #[must_use = "builder methods return a new value"]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn division(mut self, division: Division) -> Self {
        self.config.division = division;
        self
    }

    /// Rotation period; only used with [`Division::Time`]
    #[must_use = "builder methods return a new value"]
    pub fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.config.time_unit = unit;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn info_file(mut self, path: impl Into<String>) -> Self {
        self.config.info_filename = path.into();
        self
    }

    /// Route warn and above to `path`; enables level separation
    #[must_use = "builder methods return a new value"]
    pub fn error_file(mut self, path: impl Into<String>) -> Self {
        self.config.error_filename = path.into();
        self.config.level_separate = true;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level_separate(mut self, enabled: bool) -> Self {
        self.config.level_separate = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Stop writing to stdout
    #[must_use = "builder methods return a new value"]
    pub fn close_console_display(mut self) -> Self {
        self.config.close_display = true;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_size(mut self, megabytes: u64) -> Self {
        self.config.max_size = megabytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_backups(mut self, count: usize) -> Self {
        self.config.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_age(mut self, days: u32) -> Self {
        self.config.max_age = days;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn compress(mut self, enabled: bool) -> Self {
        self.config.compress = enabled;
        self
    }

    /// Annotate entries with their call site
    ///
    /// `skip` walks that many frames further up for both the caller and
    /// captured stacktraces, for applications logging through wrapper
    /// functions. A frame that cannot be resolved falls back to the direct
    /// call site.
    #[must_use = "builder methods return a new value"]
    pub fn caller(mut self, enable: bool, skip: usize) -> Self {
        self.config.caller = enable;
        self.config.caller_skip = skip;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn short_caller(mut self, enabled: bool) -> Self {
        self.config.short_caller = enabled;
        self
    }

    /// Attach stacktraces to warn and above
    #[must_use = "builder methods return a new value"]
    pub fn stacktrace(mut self, enabled: bool) -> Self {
        self.config.stacktrace = enabled;
        self
    }

    /// Keys for the timestamp and level elements; empty omits the element
    #[must_use = "builder methods return a new value"]
    pub fn keys(mut self, time_key: impl Into<String>, level_key: impl Into<String>) -> Self {
        self.config.time_key = time_key.into();
        self.config.level_key = level_key.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn time_format(mut self, format: TimestampFormat) -> Self {
        self.config.time_format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sentry(mut self, sentry: SentryConfig) -> Self {
        self.config.sentry_config = sentry;
        self
    }

    /// Build even when no destination is active, discarding every entry
    #[must_use = "builder methods return a new value"]
    pub fn allow_discard(mut self, allow: bool) -> Self {
        self.config.allow_discard = allow;
        self
    }

    /// Add a destination that receives entries like stdout does
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    /// Report error-and-above entries to `reporter` instead of the
    /// configured Sentry DSN
    #[must_use = "builder methods return a new value"]
    pub fn reporter(mut self, reporter: Arc<dyn RemoteReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn fatal_hook(mut self, hook: FatalHook) -> Self {
        self.fatal_hook = hook;
        self
    }

    /// Assemble the logger
    ///
    /// # Errors
    ///
    /// - [`LoggerError::InvalidConfiguration`] for values out of range
    /// - file errors when a log file or its directory cannot be created
    /// - [`LoggerError::NoDestination`] when stdout is closed, no file is
    ///   set and `allow_discard` is off
    ///
    /// An unusable Sentry DSN is not an error: it is reported on stderr and
    /// the logger is built without remote reporting.
    pub fn build(self) -> Result<Logger> {
        let LoggerBuilder {
            config,
            appenders,
            reporter,
            fatal_hook,
        } = self;
        config.validate()?;

        let encoder = Encoder::new(config.encoding, config.encoder_config());
        let metrics = Arc::new(LoggerMetrics::new());

        let mut info_writers = WriterSet::new();
        let mut warn_writers = WriterSet::new();

        let mut both = |appender: SharedAppender| {
            info_writers.push_shared(Arc::clone(&appender));
            warn_writers.push_shared(appender);
        };
        if !config.close_display {
            let console: Box<dyn Appender> = Box::new(ConsoleAppender::new());
            both(Arc::new(Mutex::new(console)));
        }
        for appender in appenders {
            both(Arc::new(Mutex::new(appender)));
        }

        let strategy = config.rotation_strategy();
        if !config.info_filename.is_empty() {
            info_writers.push_shared(Arc::new(Mutex::new(strategy.open(&config.info_filename)?)));
        }
        if config.splits_files() {
            warn_writers.push_shared(Arc::new(Mutex::new(strategy.open(&config.error_filename)?)));
        }

        let mut tee = Tee::default();
        if config.level_separate {
            if !info_writers.is_empty() {
                tee.push(Arc::new(IoCore::new(
                    encoder.clone(),
                    info_writers,
                    LevelFilter::info_range(config.level),
                )));
            }
            if !warn_writers.is_empty() {
                tee.push(Arc::new(IoCore::new(
                    encoder,
                    warn_writers,
                    LevelFilter::warn_and_above(config.level),
                )));
            }
        } else if !info_writers.is_empty() {
            tee.push(Arc::new(IoCore::new(
                encoder,
                info_writers,
                LevelFilter::at_least(config.level),
            )));
        }

        if tee.is_empty() {
            if !config.allow_discard {
                return Err(LoggerError::NoDestination);
            }
            eprintln!("[LOGGER WARNING] No log destination configured; entries will be discarded.");
        }

        if let Some(reporter) = reporter.or_else(|| sentry_reporter(&config.sentry_config, &metrics)) {
            let sentry = &config.sentry_config;
            tee.push(Arc::new(
                ReportingCore::new(reporter)
                    .environment(sentry.environment.clone())
                    .tags(sentry.tags.clone())
                    .attach_stacktrace(sentry.attach_stacktrace, config.caller_skip),
            ));
        }

        Ok(Logger {
            shared: Arc::new(Shared {
                core: tee,
                metrics,
                add_caller: config.caller,
                stacktrace: config.stacktrace,
                caller_skip: config.caller_skip,
                fatal_hook,
            }),
            name: config.name.filter(|n| !n.is_empty()),
            fields: Arc::new(Vec::new()),
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn sentry_reporter(
    sentry: &SentryConfig,
    metrics: &Arc<LoggerMetrics>,
) -> Option<Arc<dyn RemoteReporter>> {
    if !sentry.is_enabled() {
        return None;
    }
    match sentry.dsn.parse::<Dsn>() {
        Ok(dsn) => {
            let options = ReporterOptions {
                debug: sentry.debug,
                sample_rate: sentry.sample_rate,
                queue_capacity: sentry.queue_capacity,
            };
            Some(Arc::new(SentryReporter::new(dsn, options, Arc::clone(metrics))))
        }
        Err(e) => {
            eprintln!(
                "[LOGGER WARNING] Remote reporting disabled, continuing without it: {}",
                e
            );
            None
        }
    }
}
