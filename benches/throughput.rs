use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use tablewatch::aggregate::aggregate;
use tablewatch::fetch::fetch_history;
use tablewatch::generator::{SummaryGenerator, DEMO_TABLES};
use tablewatch::series::metric_figure;
use tablewatch::store::{MemoryStore, Store};
use tablewatch::types::{Granularity, Metric, RecordSample, TIMESTAMP_FORMAT};

fn demo_history(minutes: usize) -> Vec<RecordSample> {
    let mut generator = SummaryGenerator::new(0.01);
    let end = chrono::NaiveDateTime::parse_from_str("202603010000", TIMESTAMP_FORMAT).unwrap();
    generator
        .generate_history(end, minutes)
        .into_iter()
        .filter(|s| s.table_name == DEMO_TABLES[0].0)
        .collect()
}

fn aggregation_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for size in [1_000usize, 10_000, 50_000] {
        let samples = demo_history(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &samples, |b, samples| {
            b.iter(|| aggregate(samples, Granularity::Hourly));
        });
    }
    group.finish();
}

fn figure_build(c: &mut Criterion) {
    let samples = demo_history(10_000);
    let windows = aggregate(&samples, Granularity::Hourly);

    c.bench_function("metric_figure", |b| {
        b.iter(|| metric_figure(DEMO_TABLES[0].0, Metric::Created, &windows));
    });
}

fn paged_fetch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = Store::Memory(MemoryStore::from_samples(demo_history(10_000)));

    let mut group = c.benchmark_group("fetch_history");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("paged_10k", |b| {
        b.iter(|| {
            rt.block_on(fetch_history(&store, DEMO_TABLES[0].0, None, 500))
                .unwrap()
        });
    });
    group.finish();
}

criterion_group!(benches, aggregation_throughput, figure_build, paged_fetch);
criterion_main!(benches);
