//! String building benchmarks.
//!
//! Compares the fail-fast builders against their `std` counterparts and
//! measures the cost of the second formatting pass.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use failloc_mem::{PROBE_SIZE, Table, concat, duplicate_string, format_str};

fn bench_concat(c: &mut Criterion) {
    let mut group = c.benchmark_group("concat");

    for count in [2usize, 8, 31].iter() {
        let parts: Vec<String> = (0..*count).map(|i| format!("fragment_{i}")).collect();
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();

        group.bench_with_input(BenchmarkId::new("failloc", count), &refs, |b, refs| {
            b.iter(|| black_box(concat("head/", refs)));
        });
        group.bench_with_input(BenchmarkId::new("std", count), &refs, |b, refs| {
            b.iter(|| {
                let mut s = String::from("head/");
                for part in refs {
                    s.push_str(part);
                }
                black_box(s.into_boxed_str())
            });
        });
    }

    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");

    // One pass below the probe size, two at and above it.
    for len in [PROBE_SIZE / 2, PROBE_SIZE, PROBE_SIZE * 8].iter() {
        let text = "z".repeat(*len);
        group.bench_with_input(BenchmarkId::new("failloc", len), &text, |b, text| {
            b.iter(|| black_box(format_str!("{text}")));
        });
        group.bench_with_input(BenchmarkId::new("std", len), &text, |b, text| {
            b.iter(|| black_box(format!("{text}").into_boxed_str()));
        });
    }

    group.finish();
}

fn bench_duplicate(c: &mut Criterion) {
    c.bench_function("duplicate_string", |b| {
        b.iter(|| black_box(duplicate_string(black_box("/var/lib/amanda/gnutar-lists"))));
    });
}

fn bench_table_grow(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_grow");

    for bump in [1usize, 16, 256].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(bump), bump, |b, &bump| {
            b.iter(|| {
                let mut table: Table<u64> = Table::new();
                for needed in 0..1_000 {
                    table.grow(needed, bump);
                }
                black_box(table.capacity())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_concat, bench_format, bench_duplicate, bench_table_grow);
criterion_main!(benches);
