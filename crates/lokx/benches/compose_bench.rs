//! 📊 How much does gzip cost per batch? Criterion knows.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lokx::composers::{Composer, GzipJsonComposer, JsonComposer};
use lokx::{PushBatch, push_item};

fn sample_batch(entries: usize) -> PushBatch {
    PushBatch::new(
        (0..entries)
            .map(|n| {
                push_item(
                    [("app", "bench"), ("host", "box-01"), ("level", "info")],
                    [format!("request {n} handled in 12ms, status=200 path=/api/v1/things")],
                )
            })
            .collect(),
    )
}

fn compose_benchmark(c: &mut Criterion) {
    let batch = sample_batch(500);
    let mut group = c.benchmark_group("compose_500_entries");

    group.bench_function("json", |b| {
        b.iter(|| JsonComposer.compose(black_box(&batch)))
    });
    group.bench_function("gzip_json", |b| {
        b.iter(|| GzipJsonComposer.compose(black_box(&batch)))
    });

    group.finish();
}

criterion_group!(benches, compose_benchmark);
criterion_main!(benches);
