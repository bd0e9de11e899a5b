//! Severity filters deciding which entries a core admits

use super::log_level::LogLevel;

/// Severity at which entries move to the warn/error destination
pub const WARN_THRESHOLD: LogLevel = LogLevel::Warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelFilter {
    /// Admit `level >= min`
    AtLeast(LogLevel),
    /// Admit `min <= level < below`
    Range { min: LogLevel, below: LogLevel },
}

impl LevelFilter {
    #[must_use]
    pub fn at_least(min: LogLevel) -> Self {
        LevelFilter::AtLeast(min)
    }

    /// Below-warn half of a level-separated pair: `[min, Warn)`
    #[must_use]
    pub fn info_range(min: LogLevel) -> Self {
        LevelFilter::Range {
            min,
            below: WARN_THRESHOLD,
        }
    }

    /// Warn-and-above half of a level-separated pair
    ///
    /// A minimum above warn still applies here.
    #[must_use]
    pub fn warn_and_above(min: LogLevel) -> Self {
        LevelFilter::AtLeast(min.max(WARN_THRESHOLD))
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        match *self {
            LevelFilter::AtLeast(min) => level >= min,
            LevelFilter::Range { min, below } => level >= min && level < below,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_least() {
        let filter = LevelFilter::at_least(LogLevel::Info);
        assert!(!filter.enabled(LogLevel::Debug));
        assert!(filter.enabled(LogLevel::Info));
        assert!(filter.enabled(LogLevel::Fatal));
    }

    #[test]
    fn test_warn_boundary_is_not_shared() {
        let info = LevelFilter::info_range(LogLevel::Debug);
        let warn = LevelFilter::warn_and_above(LogLevel::Debug);

        assert!(!info.enabled(LogLevel::Warn));
        assert!(warn.enabled(LogLevel::Warn));

        for level in LogLevel::ALL {
            assert!(
                info.enabled(level) ^ warn.enabled(level),
                "{} must be admitted by exactly one filter",
                level
            );
        }
    }

    #[test]
    fn test_min_above_warn() {
        let info = LevelFilter::info_range(LogLevel::Error);
        assert!(LogLevel::ALL.iter().all(|l| !info.enabled(*l)));

        let warn = LevelFilter::warn_and_above(LogLevel::Error);
        assert!(!warn.enabled(LogLevel::Warn));
        assert!(warn.enabled(LogLevel::Error));
    }
}
