//! Location cache benchmarks.
//!
//! Tokens are never freed, so only repeat sites are measured:
//! - Re-interning the head (hash lookup only)
//! - Re-interning older sites (lookup + unlink + relink)

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use failloc_mem::LocationCache;

fn bench_intern_head(c: &mut Criterion) {
    c.bench_function("intern_head", |b| {
        let mut cache = LocationCache::new();
        cache.intern("src/driver.rs", 42);
        b.iter(|| black_box(cache.intern("src/driver.rs", 42)));
    });
}

fn bench_intern_promote(c: &mut Criterion) {
    let mut group = c.benchmark_group("intern_promote");

    for size in [10u32, 100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut cache = LocationCache::new();
            for line in 0..size {
                cache.intern("src/driver.rs", line);
            }
            // Cycling through every site always promotes the tail.
            let mut line = 0;
            b.iter(|| {
                black_box(cache.intern("src/driver.rs", line));
                line = (line + 1) % size;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_intern_head, bench_intern_promote);
criterion_main!(benches);
