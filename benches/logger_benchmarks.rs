//! Criterion benchmarks for teelog

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use teelog::core::log_entry::LogEntry;
use teelog::core::{Encoder, EncoderConfig};
use teelog::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Encoding Benchmarks
// ============================================================================

fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");
    group.throughput(Throughput::Elements(1));

    let entry = LogEntry::new(LogLevel::Info, "Request processed").with_fields(vec![
        with("user", "alice"),
        with("status", 200),
        with("elapsed_ms", 12.5),
    ]);

    for encoding in [Encoding::Json, Encoding::Console] {
        let encoder = Encoder::new(encoding, EncoderConfig::default());
        group.bench_function(format!("{:?}", encoding).to_lowercase(), |b| {
            b.iter(|| black_box(encoder.encode(black_box(&entry), false)));
        });
    }

    group.finish();
}

// ============================================================================
// Logging Performance Benchmarks
// ============================================================================

fn bench_file_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_logging");
    group.throughput(Throughput::Elements(1));

    let temp_dir = TempDir::new().unwrap();
    let split = Logger::builder()
        .close_console_display()
        .encoding(Encoding::Json)
        .info_file(temp_dir.path().join("bench.log").to_str().unwrap())
        .error_file(temp_dir.path().join("bench_err.log").to_str().unwrap())
        .build()
        .unwrap();

    group.bench_function("info_with_fields", |b| {
        b.iter(|| split.info(black_box("benchmark message"), &[with("iteration", 1)]));
    });

    group.bench_function("error_split_file", |b| {
        b.iter(|| split.error(black_box("benchmark failure"), &[]));
    });

    group.bench_function("filtered_debug", |b| {
        b.iter(|| split.debug(black_box("never written"), &[]));
    });

    group.bench_function("infof", |b| {
        b.iter(|| split.infof(format_args!("value {}", black_box(42))));
    });

    group.finish();
}

fn bench_size_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("size_rotation");
    group.throughput(Throughput::Elements(1));

    let temp_dir = TempDir::new().unwrap();
    let logger = Logger::builder()
        .close_console_display()
        .encoding(Encoding::Json)
        .max_size(1)
        .max_backups(3)
        .info_file(temp_dir.path().join("rotating.log").to_str().unwrap())
        .build()
        .unwrap();
    let padding = "p".repeat(200);

    group.bench_function("rotating_writes", |b| {
        b.iter(|| logger.info("rotating", &[with("pad", padding.as_str())]));
    });

    group.finish();
}

criterion_group!(benches, bench_encoding, bench_file_logging, bench_size_rotation);
criterion_main!(benches);
