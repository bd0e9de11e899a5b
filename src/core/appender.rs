//! Appender trait for log output destinations

use super::error::Result;

/// One output destination inside a writer set
///
/// Appenders receive records that are already encoded and newline
/// terminated. A record must be written whole: the owning writer set
/// serializes calls, so an implementation never sees two records at once.
pub trait Appender: Send + Sync {
    fn append(&mut self, record: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;

    /// Whether this destination wants the colorized console rendering
    fn colorize(&self) -> bool {
        false
    }
}
