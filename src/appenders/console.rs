//! Console appender implementation

use crate::core::{Appender, Result};
use std::io::{IsTerminal, Write};

/// Writes records to stdout
///
/// Each record is written under the stdout lock, so concurrent loggers
/// never interleave within a line.
pub struct ConsoleAppender {
    use_colors: bool,
}

impl ConsoleAppender {
    /// Colorize when stdout is a terminal
    pub fn new() -> Self {
        Self {
            use_colors: std::io::stdout().is_terminal(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, record: &[u8]) -> Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(record)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }

    fn colorize(&self) -> bool {
        self.use_colors
    }
}
