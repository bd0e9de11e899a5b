//! Time-rotating file appender
//!
//! Writes to `<base><suffix>` where the suffix is the current time formatted
//! for the configured [`TimeUnit`]. The first write after a unit boundary
//! opens the next file.

use super::rotating_file::create_parent_dir;
use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, SystemTime};

/// Granularity of time-based rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minute,
    #[default]
    Hour,
    Day,
    Month,
    Year,
}

impl TimeUnit {
    /// strftime suffix appended to the base file name
    pub fn pattern(&self) -> &'static str {
        match self {
            TimeUnit::Minute => ".%Y%m%d%H%M",
            TimeUnit::Hour => ".%Y%m%d%H",
            TimeUnit::Day => ".%Y%m%d",
            TimeUnit::Month => ".%Y%m",
            TimeUnit::Year => ".%Y",
        }
    }

    /// Nominal length of one period
    pub fn rotation_gap(&self) -> Duration {
        const MINUTE: u64 = 60;
        const HOUR: u64 = 60 * MINUTE;
        const DAY: u64 = 24 * HOUR;
        Duration::from_secs(match self {
            TimeUnit::Minute => MINUTE,
            TimeUnit::Hour => HOUR,
            TimeUnit::Day => DAY,
            TimeUnit::Month => 30 * DAY,
            TimeUnit::Year => 365 * DAY,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Minute => "minute",
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::Month => "month",
            TimeUnit::Year => "year",
        }
    }

    /// Suffix for the period containing `now`
    pub fn format(&self, now: &DateTime<Local>) -> String {
        now.format(self.pattern()).to_string()
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "minute" => Ok(TimeUnit::Minute),
            "hour" => Ok(TimeUnit::Hour),
            "day" => Ok(TimeUnit::Day),
            "month" => Ok(TimeUnit::Month),
            "year" => Ok(TimeUnit::Year),
            other => Err(LoggerError::config(
                "time_unit",
                format!("unknown unit '{}'", other),
            )),
        }
    }
}

/// File appender switching files per time period
///
/// # Examples
///
/// ```no_run
/// use teelog::appenders::{TimeRotatingFileAppender, TimeUnit};
///
/// // app.log.2025010810, app.log.2025010811, ...; files older than 7 days are removed
/// let appender = TimeRotatingFileAppender::new("/var/log/app.log", TimeUnit::Hour, 7).unwrap();
/// ```
pub struct TimeRotatingFileAppender {
    base_path: PathBuf,
    unit: TimeUnit,
    max_age: Option<Duration>,
    active_path: PathBuf,
    writer: Option<LineWriter<File>>,
}

impl TimeRotatingFileAppender {
    /// `max_age_days` of zero keeps rotated files forever
    ///
    /// # Errors
    ///
    /// Returns error if the directory or the first period's file cannot be created
    pub fn new<P: AsRef<Path>>(path: P, unit: TimeUnit, max_age_days: u32) -> Result<Self> {
        Self::open_at(path, unit, max_age_days, Local::now())
    }

    pub(crate) fn open_at<P: AsRef<Path>>(
        path: P,
        unit: TimeUnit,
        max_age_days: u32,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        create_parent_dir(&base_path)?;

        let active_path = Self::path_for(&base_path, unit, &now);
        let file = Self::open_file(&active_path)?;

        Ok(Self {
            base_path,
            unit,
            max_age: (max_age_days > 0)
                .then(|| Duration::from_secs(u64::from(max_age_days) * 24 * 3600)),
            active_path,
            writer: Some(LineWriter::new(file)),
        })
    }

    fn path_for(base: &Path, unit: TimeUnit, now: &DateTime<Local>) -> PathBuf {
        let mut name = base.as_os_str().to_os_string();
        name.push(unit.format(now));
        PathBuf::from(name)
    }

    fn open_file(path: &Path) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
            })
    }

    /// Append a record as if written at `now`
    pub(crate) fn append_at(&mut self, record: &[u8], now: DateTime<Local>) -> Result<()> {
        let target = Self::path_for(&self.base_path, self.unit, &now);
        if target != self.active_path || self.writer.is_none() {
            self.switch_to(target)?;
        }

        let writer = self.writer.as_mut().ok_or_else(|| {
            LoggerError::file_appender(self.active_path.display().to_string(), "Writer not initialized")
        })?;
        writer.write_all(record).map_err(|e| {
            LoggerError::file_appender(
                self.active_path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })
    }

    fn switch_to(&mut self, target: PathBuf) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                eprintln!(
                    "[WARN] Failed to flush {} before switching files: {}",
                    self.active_path.display(),
                    e
                );
            }
        }

        let file = Self::open_file(&target).map_err(|e| {
            LoggerError::file_rotation(
                target.display().to_string(),
                format!("Failed to open next period's file: {}", e),
            )
        })?;
        self.writer = Some(LineWriter::new(file));
        self.active_path = target;

        if let Some(max_age) = self.max_age {
            self.prune_expired(max_age);
        }
        Ok(())
    }

    /// Remove earlier periods' files older than `max_age`
    fn prune_expired(&self, max_age: Duration) {
        let Some(dir) = self.base_path.parent().map(|p| {
            if p.as_os_str().is_empty() {
                Path::new(".")
            } else {
                p
            }
        }) else {
            return;
        };
        let Some(prefix) = self
            .base_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| format!("{}.", n))
        else {
            return;
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("[WARN] Cannot scan {} for expired logs: {}", dir.display(), e);
                return;
            }
        };

        let now = SystemTime::now();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path == self.active_path {
                continue;
            }
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(&prefix));
            if !matches {
                continue;
            }

            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| now.duration_since(modified).unwrap_or(Duration::ZERO) > max_age)
                .unwrap_or(false);
            if expired {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!("[WARN] Failed to remove expired log {}: {}", path.display(), e);
                }
            }
        }
    }

    /// File currently receiving records
    #[must_use]
    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    #[must_use]
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }
}

impl Appender for TimeRotatingFileAppender {
    fn name(&self) -> &str {
        "time_rotating_file"
    }

    fn append(&mut self, record: &[u8]) -> Result<()> {
        self.append_at(record, Local::now())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.active_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for TimeRotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap()
    }

    fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|n| n.starts_with(prefix))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_unit_patterns() {
        let now = at(2025, 1, 8, 10, 30, 45);
        assert_eq!(TimeUnit::Minute.format(&now), ".202501081030");
        assert_eq!(TimeUnit::Hour.format(&now), ".2025010810");
        assert_eq!(TimeUnit::Day.format(&now), ".20250108");
        assert_eq!(TimeUnit::Month.format(&now), ".202501");
        assert_eq!(TimeUnit::Year.format(&now), ".2025");
        assert_eq!(TimeUnit::Minute.rotation_gap(), Duration::from_secs(60));
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("Day".parse::<TimeUnit>().unwrap(), TimeUnit::Day);
        assert!("week".parse::<TimeUnit>().is_err());
        let unit: TimeUnit = serde_json::from_str("\"minute\"").unwrap();
        assert_eq!(unit, TimeUnit::Minute);
        assert_eq!(TimeUnit::default(), TimeUnit::Hour);
    }

    #[test]
    fn test_minute_unit_switches_files() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("app.log");
        let first = at(2025, 1, 8, 10, 30, 5);
        let second = at(2025, 1, 8, 10, 31, 5);

        let mut appender = TimeRotatingFileAppender::open_at(&base, TimeUnit::Minute, 0, first).unwrap();
        appender.append_at(b"first\n", first).unwrap();
        appender.append_at(b"second\n", second).unwrap();
        appender.flush().unwrap();

        let names = files_with_prefix(dir.path(), "app.log");
        assert_eq!(names, ["app.log.202501081030", "app.log.202501081031"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.202501081030")).unwrap(),
            "first\n"
        );
        assert_eq!(appender.active_path(), dir.path().join("app.log.202501081031"));
    }

    #[test]
    fn test_hour_unit_shares_file_within_hour() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("app.log");
        let first = at(2025, 1, 8, 10, 5, 0);
        let second = at(2025, 1, 8, 10, 55, 0);

        let mut appender = TimeRotatingFileAppender::open_at(&base, TimeUnit::Hour, 0, first).unwrap();
        appender.append_at(b"a\n", first).unwrap();
        appender.append_at(b"b\n", second).unwrap();
        appender.flush().unwrap();

        assert_eq!(files_with_prefix(dir.path(), "app.log"), ["app.log.2025010810"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.2025010810")).unwrap(),
            "a\nb\n"
        );
    }

    #[test]
    fn test_prune_removes_only_expired_siblings() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("svc.log");
        let stale = dir.path().join("svc.log.2020010100");
        let unrelated = dir.path().join("other.log.2020010100");
        fs::write(&stale, "old\n").unwrap();
        fs::write(&unrelated, "keep\n").unwrap();

        let ten_days_ago = SystemTime::now() - Duration::from_secs(10 * 24 * 3600);
        for path in [&stale, &unrelated] {
            File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_modified(ten_days_ago)
                .unwrap();
        }

        let first = at(2025, 1, 8, 10, 0, 0);
        let mut appender = TimeRotatingFileAppender::open_at(&base, TimeUnit::Hour, 1, first).unwrap();
        appender.append_at(b"x\n", at(2025, 1, 8, 11, 0, 0)).unwrap();

        assert!(!stale.exists());
        assert!(unrelated.exists());
        assert!(dir.path().join("svc.log.2025010811").exists());
    }
}
