//! Rotation tests through the full logger
//!
//! Size rotation must not lose or reorder entries across backups.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use teelog::prelude::*;

const ENTRY_COUNT: i64 = 10_000;

fn backup(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

#[test]
fn test_size_rotation_keeps_every_entry_in_order() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_file = temp_dir.path().join("rotate.log");

    let logger = Logger::builder()
        .close_console_display()
        .encoding(Encoding::Json)
        .division(Division::Size)
        .max_size(1)
        .level(LogLevel::Info)
        .info_file(info_file.to_str().unwrap())
        .build()
        .expect("Failed to build logger");

    // ~250 bytes per entry, so 10k entries span a few megabytes
    let padding = "x".repeat(160);
    for seq in 0..ENTRY_COUNT {
        logger.info("rotation entry", &[with("seq", seq), with("pad", padding.as_str())]);
    }
    logger.sync().unwrap();

    let mut backups = 0;
    while backup(&info_file, backups + 1).exists() {
        backups += 1;
    }
    assert!(backups >= 1, "expected at least one size backup");

    let limit = 1024 * 1024;
    let mut files: Vec<PathBuf> = (1..=backups).rev().map(|i| backup(&info_file, i)).collect();
    files.push(info_file.clone());

    let mut seqs = Vec::with_capacity(ENTRY_COUNT as usize);
    for file in &files {
        let content = fs::read_to_string(file).unwrap();
        let longest = content.lines().map(|l| l.len() as u64 + 1).max().unwrap_or(0);
        assert!(
            content.len() as u64 <= limit + longest,
            "{} exceeds the size limit",
            file.display()
        );

        for line in content.lines() {
            let entry: serde_json::Value = serde_json::from_str(line).unwrap();
            seqs.push(entry["seq"].as_i64().unwrap());
        }
    }

    assert_eq!(seqs, (0..ENTRY_COUNT).collect::<Vec<i64>>());
    assert_eq!(logger.dropped_count(), 0);
}

#[test]
fn test_size_rotation_respects_max_backups() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_file = temp_dir.path().join("bounded.log");

    let logger = Logger::builder()
        .close_console_display()
        .encoding(Encoding::Json)
        .max_size(1)
        .max_backups(1)
        .info_file(info_file.to_str().unwrap())
        .build()
        .unwrap();

    let padding = "y".repeat(1000);
    for seq in 0..3000 {
        logger.info("bounded", &[with("seq", seq), with("pad", padding.as_str())]);
    }
    logger.sync().unwrap();

    assert!(backup(&info_file, 1).exists());
    assert!(!backup(&info_file, 2).exists());
}

#[test]
fn test_compressed_backups_through_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_file = temp_dir.path().join("gz.log");

    let mut config = LoggerConfig::default();
    config.close_display = true;
    config.info_filename = info_file.to_str().unwrap().to_string();
    config.max_size = 1;
    config.compress = true;

    let logger = Logger::from_config(config).unwrap();
    let padding = "z".repeat(1000);
    for seq in 0..1500 {
        logger.info("compressed", &[with("seq", seq), with("pad", padding.as_str())]);
    }
    logger.sync().unwrap();

    let mut gz = backup(&info_file, 1).into_os_string();
    gz.push(".gz");
    assert!(PathBuf::from(gz).exists());
    assert!(!backup(&info_file, 1).exists());
}
