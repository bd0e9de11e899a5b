//! Size-rotating file appender
//!
//! The active file keeps its configured name. When the next record would
//! push it past the size limit it is renamed to `<name>.1`, older backups
//! shift up by one (`<name>.1` becomes `<name>.2`, ...) and a fresh file is
//! opened. Backups can be gzipped and pruned by count and by age.
//!
//! Compression runs on a background thread so a large backup does not hold
//! up the writers. The next rotation and every flush wait for it to finish.

use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

const MEGABYTE: u64 = 1024 * 1024;

/// Size limit used when `max_size` is configured as zero
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

/// Configuration for size-based rotation
///
/// # Examples
///
/// ```
/// use teelog::appenders::SizeRotationPolicy;
///
/// // 50 MB files, keep 7 gzipped backups for at most 30 days
/// let policy = SizeRotationPolicy::from_megabytes(50)
///     .with_max_backups(7)
///     .with_max_age_days(30)
///     .with_compression(true);
/// assert_eq!(policy.max_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeRotationPolicy {
    /// Rotate before the active file would exceed this many bytes
    pub max_bytes: u64,
    /// Maximum number of backups to keep; zero keeps all of them
    pub max_backups: usize,
    /// Delete backups older than this
    pub max_age: Option<Duration>,
    /// Whether to gzip rotated files
    pub compress: bool,
}

impl Default for SizeRotationPolicy {
    fn default() -> Self {
        Self::from_megabytes(DEFAULT_MAX_SIZE_MB)
    }
}

impl SizeRotationPolicy {
    /// Policy rotating at `megabytes` MB; zero means [`DEFAULT_MAX_SIZE_MB`]
    #[must_use]
    pub fn from_megabytes(megabytes: u64) -> Self {
        let megabytes = if megabytes == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            megabytes
        };
        Self {
            max_bytes: megabytes.saturating_mul(MEGABYTE),
            max_backups: 0,
            max_age: None,
            compress: false,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes.max(1);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    /// Zero days keeps backups regardless of age
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, days: u32) -> Self {
        self.max_age = (days > 0).then(|| Duration::from_secs(u64::from(days) * 24 * 3600));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

/// File appender rotating on size
///
/// # Examples
///
/// ```no_run
/// use teelog::appenders::{RotatingFileAppender, SizeRotationPolicy};
///
/// let policy = SizeRotationPolicy::from_megabytes(10).with_max_backups(5);
/// let appender = RotatingFileAppender::with_policy("/var/log/app.log", policy).unwrap();
/// ```
pub struct RotatingFileAppender {
    base_path: PathBuf,
    policy: SizeRotationPolicy,
    writer: Option<LineWriter<File>>,
    current_size: u64,
    /// Counter for consecutive deletion failures (reset on successful deletion)
    deletion_failure_count: usize,
    /// Gzip job for the most recent backup
    pending_compression: Option<JoinHandle<()>>,
}

impl RotatingFileAppender {
    /// Create a rotating file appender with the default policy
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or opened
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, SizeRotationPolicy::default())
    }

    /// Create a rotating file appender with custom policy
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory or the file cannot be created
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: SizeRotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        create_parent_dir(&base_path)?;

        let (file, current_size) = Self::open_file(&base_path)?;

        Ok(Self {
            base_path,
            policy,
            writer: Some(LineWriter::new(file)),
            current_size,
            deletion_failure_count: 0,
            pending_compression: None,
        })
    }

    fn open_file(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_appender(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();
        Ok((file, size))
    }

    /// Rotation is due when a non-empty file would grow past the limit
    fn should_rotate(&self, incoming: u64) -> bool {
        self.current_size > 0 && self.current_size.saturating_add(incoming) > self.policy.max_bytes
    }

    /// Perform log rotation
    fn rotate(&mut self) -> Result<()> {
        // Backups are renamed below; the previous gzip job must not race that
        self.wait_for_compression();

        // Explicitly drop writer to release file handle before renaming
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let existing = self.highest_backup_index();
        let keep = if self.policy.max_backups == 0 {
            existing + 1
        } else {
            self.policy.max_backups
        };

        self.remove_backups_from(keep, existing)?;

        // Shift surviving backups up by one, oldest first
        for i in (1..keep.min(existing + 1)).rev() {
            self.shift_backup(i)?;
        }

        let backup_path = self.backup_path(1);
        if self.base_path.exists() {
            fs::rename(&self.base_path, &backup_path).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;
        }

        if let Some(max_age) = self.policy.max_age {
            self.prune_expired(max_age);
        }

        if self.policy.compress && backup_path.exists() {
            self.spawn_compression(backup_path);
        }

        let (file, size) = Self::open_file(&self.base_path).map_err(|e| {
            LoggerError::file_rotation(
                self.base_path.display().to_string(),
                format!("Failed to create new log file: {}", e),
            )
        })?;

        self.writer = Some(LineWriter::new(file));
        self.current_size = size;

        Ok(())
    }

    fn spawn_compression(&mut self, path: PathBuf) {
        let job_path = path.clone();
        let spawned = thread::Builder::new()
            .name("teelog-compress".to_string())
            .spawn(move || {
                if let Err(e) = compress_file(&job_path) {
                    eprintln!("[WARN] Failed to compress rotated log: {}", e);
                }
            });

        match spawned {
            Ok(handle) => self.pending_compression = Some(handle),
            Err(e) => {
                eprintln!("[WARN] Cannot start compression thread ({}), compressing inline", e);
                if let Err(e) = compress_file(&path) {
                    eprintln!("[WARN] Failed to compress rotated log: {}", e);
                }
            }
        }
    }

    fn wait_for_compression(&mut self) {
        if let Some(handle) = self.pending_compression.take() {
            if handle.join().is_err() {
                eprintln!(
                    "[WARN] Compression thread for {} panicked",
                    self.base_path.display()
                );
            }
        }
    }

    /// Delete backups `first..=last` so the shift cannot exceed the limit
    fn remove_backups_from(&mut self, first: usize, last: usize) -> Result<()> {
        const MAX_DELETION_FAILURES: usize = 5;
        let mut deletion_failed = false;

        for i in (first..=last).rev() {
            for path in [self.backup_path(i), self.compressed_backup_path(i)] {
                if !path.exists() {
                    continue;
                }
                if let Err(e) = fs::remove_file(&path) {
                    deletion_failed = true;
                    eprintln!(
                        "[WARN] Failed to remove old backup {}: {} (failure #{}/{})",
                        path.display(),
                        e,
                        self.deletion_failure_count + 1,
                        MAX_DELETION_FAILURES
                    );
                }
            }
        }

        if deletion_failed {
            self.deletion_failure_count += 1;
            if self.deletion_failure_count >= MAX_DELETION_FAILURES {
                return Err(LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!(
                        "Rotation aborted: failed to delete old backup files {} consecutive times. \
                         This may indicate insufficient disk space or permission issues.",
                        self.deletion_failure_count
                    ),
                ));
            }
        } else {
            self.deletion_failure_count = 0;
        }
        Ok(())
    }

    /// Move backup `index` (plain or gzipped) to `index + 1`
    fn shift_backup(&self, index: usize) -> Result<()> {
        let (old_path, new_path) = if self.compressed_backup_path(index).exists() {
            (
                self.compressed_backup_path(index),
                self.compressed_backup_path(index + 1),
            )
        } else if self.backup_path(index).exists() {
            (self.backup_path(index), self.backup_path(index + 1))
        } else {
            return Ok(());
        };

        if fs::rename(&old_path, &new_path).is_err() {
            // On some platforms, rename fails if destination exists
            if new_path.exists() {
                let _ = fs::remove_file(&new_path);
            }
            fs::rename(&old_path, &new_path).map_err(|e| {
                LoggerError::file_rotation(
                    old_path.display().to_string(),
                    format!("Failed to rotate backup files: {}", e),
                )
            })?;
        }
        Ok(())
    }

    /// Backups age with their index, so expired ones form a tail
    fn prune_expired(&self, max_age: Duration) {
        let now = SystemTime::now();
        for i in (1..=self.highest_backup_index()).rev() {
            let path = if self.compressed_backup_path(i).exists() {
                self.compressed_backup_path(i)
            } else {
                self.backup_path(i)
            };

            let expired = fs::metadata(&path)
                .and_then(|m| m.modified())
                .map(|modified| now.duration_since(modified).unwrap_or(Duration::ZERO) > max_age)
                .unwrap_or(false);
            if !expired {
                break;
            }
            if let Err(e) = fs::remove_file(&path) {
                eprintln!("[WARN] Failed to remove expired backup {}: {}", path.display(), e);
                break;
            }
        }
    }

    /// Largest `i` such that backups `1..=i` all exist
    fn highest_backup_index(&self) -> usize {
        let mut index = 0;
        while self.backup_path(index + 1).exists() || self.compressed_backup_path(index + 1).exists()
        {
            index += 1;
        }
        index
    }

    /// Get backup file path for given index
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log")
            .to_string();
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }

    fn compressed_backup_path(&self, index: usize) -> PathBuf {
        gz_path(&self.backup_path(index))
    }

    /// Get current file size
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Get base path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// Get rotation policy
    #[must_use]
    pub fn policy(&self) -> &SizeRotationPolicy {
        &self.policy
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "rotating_file"
    }

    fn append(&mut self, record: &[u8]) -> Result<()> {
        let incoming = record.len() as u64;

        if self.should_rotate(incoming) {
            if let Err(e) = self.rotate() {
                // Keep writing to the current file rather than losing the record
                eprintln!(
                    "[WARN] Log rotation failed: {}. Continuing with current file.",
                    e
                );

                if self.writer.is_none() {
                    match Self::open_file(&self.base_path) {
                        Ok((file, _)) => {
                            self.writer = Some(LineWriter::new(file));
                        }
                        Err(reopen_err) => {
                            eprintln!(
                                "[ERROR] Failed to reopen log file after rotation failure: {}",
                                reopen_err
                            );
                            return Err(e);
                        }
                    }
                }

                // Reset size tracking to prevent a rotation attempt on every write
                self.current_size = 0;
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::file_appender(self.base_path.display().to_string(), "Writer not initialized"))?;

        writer.write_all(record).map_err(|e| {
            LoggerError::file_appender(
                self.base_path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        self.current_size += incoming;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.wait_for_compression();
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            // Best effort flush - ignore errors during drop
            let _ = writer.flush();
        }
        self.wait_for_compression();
    }
}

/// Create the parent directory of a log file if it doesn't exist
pub(crate) fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", parent.display()),
                e,
            )
        })?;
    }
    Ok(())
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Compress a log file with transactional safety using streaming I/O
///
/// The original file is only deleted after compression fully succeeded.
fn compress_file(path: &Path) -> Result<()> {
    use std::io::{BufReader, BufWriter};

    let gz = gz_path(path);
    let mut temp_name = gz.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_gz = PathBuf::from(temp_name);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_gz).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_gz.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let streamed = std::io::copy(&mut reader, &mut encoder).and_then(|_| encoder.finish());
    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_gz);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp_gz, &gz).map_err(|e| {
        let _ = fs::remove_file(&temp_gz);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[WARN] Compression succeeded but failed to remove original file {}: {}. \
            Both compressed and uncompressed versions exist.",
            path.display(),
            e
        );
    }

    Ok(())
}
