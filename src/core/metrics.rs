//! Logger metrics for observability
//!
//! Provides counters for monitoring logger health: records written,
//! records dropped by failing destinations and the remote report queue.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use teelog::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// // Record events
/// metrics.record_dropped();
/// metrics.record_logged();
///
/// // Check counts
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.total_logged(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Number of entries at least one destination failed to write
    dropped_count: AtomicU64,

    /// Total number of entries written to every admitting destination
    total_logged: AtomicU64,

    /// Number of events handed to the remote reporter
    reports_queued: AtomicU64,

    /// Number of events the remote reporter discarded because its queue was full
    reports_dropped: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            dropped_count: AtomicU64::new(0),
            total_logged: AtomicU64::new(0),
            reports_queued: AtomicU64::new(0),
            reports_dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reports_queued(&self) -> u64 {
        self.reports_queued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reports_dropped(&self) -> u64 {
        self.reports_dropped.load(Ordering::Relaxed)
    }

    /// Record a dropped entry, returning the previous count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_report_queued(&self) -> u64 {
        self.reports_queued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_report_dropped(&self) -> u64 {
        self.reports_dropped.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no entries have been processed.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.total_logged() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            dropped_count: AtomicU64::new(self.dropped_count()),
            total_logged: AtomicU64::new(self.total_logged()),
            reports_queued: AtomicU64::new(self.reports_queued()),
            reports_dropped: AtomicU64::new(self.reports_dropped()),
        }
    }
}
