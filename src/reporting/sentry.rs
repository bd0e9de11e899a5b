//! Sentry reporter with a background delivery worker

use super::dsn::Dsn;
use super::{RemoteReporter, ReportEvent};
use crate::core::error::{LoggerError, Result};
use crate::core::metrics::LoggerMetrics;
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Events buffered before new ones are dropped
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Timeout for one delivery request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed to drain the queue when the reporter is dropped
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct ReporterOptions {
    /// Print delivery diagnostics to stderr
    pub debug: bool,
    /// Fraction of events sent, `0.0..=1.0`
    pub sample_rate: f64,
    pub queue_capacity: usize,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            debug: false,
            sample_rate: 1.0,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Delivers one event; runs on the worker thread only
pub(crate) trait Transport: Send {
    fn send(&mut self, event: &ReportEvent) -> Result<()>;
}

struct HttpTransport {
    client: reqwest::blocking::Client,
    store_url: String,
    auth_header: String,
}

impl HttpTransport {
    fn new(dsn: &Dsn) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LoggerError::reporter(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            store_url: dsn.store_url(),
            auth_header: dsn.auth_header(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, event: &ReportEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.store_url)
            .header("X-Sentry-Auth", &self.auth_header)
            .json(event)
            .send()
            .map_err(|e| LoggerError::reporter(format!("request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(LoggerError::reporter(format!(
                "service rejected event {}: HTTP {}",
                event.event_id, status
            )))
        }
    }
}

enum Command {
    Event(Box<ReportEvent>),
    Flush(Sender<()>),
}

/// Reporter posting events to a Sentry store endpoint
///
/// `report` only enqueues. A full queue drops the event and counts it in
/// [`LoggerMetrics::reports_dropped`].
pub struct SentryReporter {
    sender: Option<Sender<Command>>,
    handle: Option<thread::JoinHandle<()>>,
    options: ReporterOptions,
    metrics: Arc<LoggerMetrics>,
}

impl SentryReporter {
    pub fn new(dsn: Dsn, options: ReporterOptions, metrics: Arc<LoggerMetrics>) -> Self {
        // The blocking client owns a runtime, so it is built on the worker
        Self::spawn(options, metrics, move || {
            Ok(Box::new(HttpTransport::new(&dsn)?) as Box<dyn Transport>)
        })
    }

    pub(crate) fn spawn<F>(options: ReporterOptions, metrics: Arc<LoggerMetrics>, make_transport: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn Transport>> + Send + 'static,
    {
        let (sender, receiver) = bounded::<Command>(options.queue_capacity.max(1));
        let debug = options.debug;

        let handle = thread::Builder::new()
            .name("teelog-reporter".to_string())
            .spawn(move || {
                let mut transport = match make_transport() {
                    Ok(transport) => Some(transport),
                    Err(e) => {
                        eprintln!("[LOGGER ERROR] Remote reporting disabled: {}", e);
                        None
                    }
                };

                for command in receiver {
                    match command {
                        Command::Event(event) => {
                            let Some(transport) = transport.as_mut() else {
                                continue;
                            };
                            match transport.send(&event) {
                                Ok(()) if debug => {
                                    eprintln!("[LOGGER DEBUG] Reported event {}", event.event_id);
                                }
                                Ok(()) => {}
                                Err(e) => {
                                    eprintln!("[LOGGER ERROR] Failed to report event: {}", e);
                                }
                            }
                        }
                        Command::Flush(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                eprintln!("[LOGGER ERROR] Cannot start reporter thread: {}", e);
                None
            }
        };

        Self {
            sender: handle.as_ref().map(|_| sender),
            handle,
            options,
            metrics,
        }
    }

    fn sampled_out(&self) -> bool {
        self.options.sample_rate < 1.0 && rand::random::<f64>() >= self.options.sample_rate
    }
}

impl RemoteReporter for SentryReporter {
    fn report(&self, event: ReportEvent) {
        if self.sampled_out() {
            if self.options.debug {
                eprintln!("[LOGGER DEBUG] Event {} sampled out", event.event_id);
            }
            return;
        }
        let Some(sender) = &self.sender else {
            return;
        };

        match sender.try_send(Command::Event(Box::new(event))) {
            Ok(()) => {
                self.metrics.record_report_queued();
            }
            Err(TrySendError::Full(_)) => {
                let dropped = self.metrics.record_report_dropped();
                if dropped == 0 || (dropped + 1) % 100 == 0 {
                    eprintln!(
                        "[LOGGER WARNING] Report queue full, {} events dropped.",
                        dropped + 1
                    );
                }
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    fn flush(&self, timeout: Duration) -> bool {
        let Some(sender) = &self.sender else {
            return true;
        };
        let deadline = Instant::now() + timeout;
        let (ack_tx, ack_rx) = bounded(1);

        if sender.send_timeout(Command::Flush(ack_tx), timeout).is_err() {
            return false;
        }
        ack_rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .is_ok()
    }
}

impl Drop for SentryReporter {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is queued and exit
        drop(self.sender.take());

        if let Some(handle) = self.handle.take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!("[LOGGER ERROR] Reporter thread panicked: {:?}", e);
                    }
                    break;
                }
                if start.elapsed() >= SHUTDOWN_TIMEOUT {
                    eprintln!(
                        "[LOGGER WARNING] Reporter did not drain within {:?}. Some reports may be lost.",
                        SHUTDOWN_TIMEOUT
                    );
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}
