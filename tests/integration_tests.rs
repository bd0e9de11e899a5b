//! Integration tests for logger assembly
//!
//! These tests verify:
//! - Warn-boundary routing under level separation
//! - Minimum level filtering
//! - Structured fields in JSON output
//! - Destination validation
//! - Thread safety
//! - Config file loading

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use teelog::prelude::*;

fn json_lines(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("Failed to read log file")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Each line must be one JSON object"))
        .collect()
}

fn path_str(path: &Path) -> String {
    path.to_str().expect("temp path is UTF-8").to_string()
}

#[test]
fn test_warn_boundary_routing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_file = temp_dir.path().join("server.log");
    let error_file = temp_dir.path().join("server_err.log");

    let logger = Logger::builder()
        .close_console_display()
        .encoding(Encoding::Json)
        .level(LogLevel::Debug)
        .info_file(path_str(&info_file))
        .error_file(path_str(&error_file))
        .build()
        .expect("Failed to build logger");

    logger.debug("debug level test", &[]);
    logger.info("info level test", &[]);
    logger.warn("warn level test", &[]);
    logger.error("error level test", &[]);
    logger.sync().expect("Failed to sync");

    let info: Vec<String> = json_lines(&info_file)
        .iter()
        .map(|e| e["level"].as_str().unwrap().to_string())
        .collect();
    let errors: Vec<String> = json_lines(&error_file)
        .iter()
        .map(|e| e["level"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(info, ["debug", "info"]);
    assert_eq!(errors, ["warn", "error"]);
}

#[test]
fn test_without_separation_one_file_gets_everything() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_file = temp_dir.path().join("all.log");
    let ignored = temp_dir.path().join("ignored_err.log");

    let mut config = LoggerConfig::default();
    config.close_display = true;
    config.encoding = Encoding::Json;
    config.info_filename = path_str(&info_file);
    config.error_filename = path_str(&ignored);
    config.level_separate = false;

    let logger = Logger::from_config(config).expect("Failed to build logger");
    logger.info("first", &[]);
    logger.warn("second", &[]);
    logger.sync().unwrap();

    assert_eq!(json_lines(&info_file).len(), 2);
    assert!(!ignored.exists(), "error file is only used with level separation");
}

#[test]
fn test_below_min_level_reaches_no_destination() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_file = temp_dir.path().join("info.log");
    let error_file = temp_dir.path().join("error.log");

    let logger = Logger::builder()
        .close_console_display()
        .encoding(Encoding::Json)
        .level(LogLevel::Error)
        .info_file(path_str(&info_file))
        .error_file(path_str(&error_file))
        .build()
        .unwrap();

    logger.debug("dropped", &[]);
    logger.info("dropped", &[]);
    logger.warn("dropped", &[]);
    logger.error("kept", &[]);
    logger.sync().unwrap();

    assert!(json_lines(&info_file).is_empty());
    let errors = json_lines(&error_file);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["msg"], "kept");
}

#[test]
fn test_structured_fields_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_file = temp_dir.path().join("fields.log");

    let logger = Logger::builder()
        .close_console_display()
        .encoding(Encoding::Json)
        .info_file(path_str(&info_file))
        .build()
        .unwrap();

    let err = std::io::Error::new(std::io::ErrorKind::Other, "sabhksasas");
    logger.error("error message", &[with("foo", "bar")]);
    logger.error("dsdadadad level test", &[with_error(&err)]);
    logger.info(
        "request",
        &[
            with("status", 200),
            with("ok", true),
            with_serde("tags", &["a", "b"]),
        ],
    );
    logger.sync().unwrap();

    let entries = json_lines(&info_file);
    assert_eq!(entries[0]["foo"], "bar");
    assert_eq!(entries[0]["msg"], "error message");
    assert_eq!(entries[1]["error"], "sabhksasas");
    assert_eq!(entries[2]["status"], 200);
    assert_eq!(entries[2]["ok"], true);
    assert_eq!(entries[2]["tags"], serde_json::json!(["a", "b"]));
}

#[test]
fn test_no_destination_is_rejected() {
    let result = Logger::builder().close_console_display().build();
    assert!(matches!(result, Err(LoggerError::NoDestination)));

    let logger = Logger::builder()
        .close_console_display()
        .allow_discard(true)
        .build()
        .expect("allow_discard must build");
    logger.error("discarded", &[with("foo", "bar")]);
    assert_eq!(logger.metrics().total_logged(), 0);
}

#[test]
fn test_unwritable_path_fails_build() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let result = Logger::builder()
        .close_console_display()
        .info_file(path_str(&blocker.join("app.log")))
        .build();
    assert!(result.is_err());
}

#[test]
fn test_console_encoding_in_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_file = temp_dir.path().join("console.log");

    let logger = Logger::builder()
        .close_console_display()
        .time_format(TimestampFormat::DateTime)
        .caller(true, 0)
        .short_caller(true)
        .name("api")
        .info_file(path_str(&info_file))
        .build()
        .unwrap();

    logger.info("User logged in", &[with("user", "alice")]);
    logger.sync().unwrap();

    let content = fs::read_to_string(&info_file).unwrap();
    let columns: Vec<&str> = content.trim_end().split('\t').collect();
    assert_eq!(columns.len(), 6);
    assert_eq!(columns[0].len(), "2025-01-08 10:30:45".len());
    assert_eq!(columns[1], "info");
    assert_eq!(columns[2], "api");
    assert!(columns[3].starts_with("tests/integration_tests.rs:"));
    assert_eq!(columns[4], "User logged in");
    assert_eq!(columns[5], r#"{"user":"alice"}"#);
    // Files never receive color escapes
    assert!(!content.contains('\u{1b}'));
}

#[test]
fn test_time_division_names_file_by_period() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let base = temp_dir.path().join("timed.log");

    let logger = Logger::builder()
        .close_console_display()
        .division(Division::Time)
        .time_unit(TimeUnit::Day)
        .info_file(path_str(&base))
        .build()
        .unwrap();
    logger.info("today", &[]);
    logger.sync().unwrap();

    let names: Vec<String> = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("timed.log."));
    assert_eq!(names[0].len(), "timed.log.20250108".len());
    assert!(!base.exists());
}

#[test]
fn test_concurrent_logging_keeps_lines_whole() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_file = temp_dir.path().join("concurrent.log");

    let logger = Arc::new(
        Logger::builder()
            .close_console_display()
            .encoding(Encoding::Json)
            .info_file(path_str(&info_file))
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|thread_id| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..250 {
                    logger.info(
                        "concurrent entry",
                        &[with("thread", thread_id), with("seq", i)],
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("logging thread panicked");
    }
    logger.sync().unwrap();

    let entries = json_lines(&info_file);
    assert_eq!(entries.len(), 8 * 250);

    // Per-thread order is preserved
    for thread_id in 0..8 {
        let seqs: Vec<i64> = entries
            .iter()
            .filter(|e| e["thread"] == thread_id)
            .map(|e| e["seq"].as_i64().unwrap())
            .collect();
        assert_eq!(seqs, (0..250).collect::<Vec<i64>>());
    }
    assert_eq!(logger.metrics().total_logged(), 2000);
}

#[test]
fn test_logger_from_yaml_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_file = temp_dir.path().join("logs").join("server.log");
    let error_file = temp_dir.path().join("logs").join("server_err.log");
    let config_path = temp_dir.path().join("config.yaml");

    fs::write(
        &config_path,
        format!(
            "encoding: json\n\
             division: size\n\
             info_filename: {}\n\
             error_filename: {}\n\
             level_separate: true\n\
             level: 0\n\
             close_display: 1\n\
             max_size: 10\n",
            path_str(&info_file),
            path_str(&error_file)
        ),
    )
    .unwrap();

    let config = LoggerConfig::from_path(&config_path).expect("Failed to load config");
    let logger = LoggerBuilder::from_config(config).build().unwrap();

    logger.debug("filtered", &[]);
    logger.info("info level test", &[]);
    logger.error("121212121212 error", &[]);
    logger.sync().unwrap();

    assert_eq!(json_lines(&info_file).len(), 1);
    assert_eq!(json_lines(&error_file)[0]["msg"], "121212121212 error");
}
