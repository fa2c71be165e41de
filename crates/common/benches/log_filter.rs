//! Benchmarks for client-side log filtering
//!
//! Measures a full filter pass over tables of different sizes:
//! - Unrestricted pass (every row visible)
//! - Level and source narrowing
//! - Date range with timestamp comparison

use common::log_filter::{FilterCriteria, LogEntry, apply_filter};
use common::test_utils::create_mock_log_records;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

fn entries(count: u64) -> Vec<LogEntry> {
    create_mock_log_records(count)
        .into_iter()
        .map(LogEntry::from)
        .collect()
}

fn benchmark_apply_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_filter");

    let cases = [
        ("all", FilterCriteria::all()),
        (
            "level_source",
            FilterCriteria::from_form("error", "usbip", "", "").unwrap(),
        ),
        (
            "date_range",
            FilterCriteria::from_form("all", "all", "2024-03-05", "2024-03-20").unwrap(),
        ),
    ];

    for size in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        for (name, criteria) in &cases {
            let mut table = entries(size);
            group.bench_with_input(BenchmarkId::new(*name, size), criteria, |b, criteria| {
                b.iter(|| apply_filter(black_box(criteria), &mut table))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_apply_filter);
criterion_main!(benches);
