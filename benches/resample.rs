//! Benchmarks for level construction, resampling and simplification.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lodview::{
    Aggregation, LevelKey, LodCache, LodStep, Range, ResampleParams, ScreenPoint, Series,
    SeriesStore, Transform, resample, simplify,
};

fn signal(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64 * 0.0005;
            t.sin() * 50.0 + (t * 37.0).cos() * 5.0
        })
        .collect()
}

fn bench_level_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("lod_build");
    for len in [100_000usize, 1_000_000, 10_000_000] {
        let mut store = SeriesStore::new();
        let id = store.insert(Series::from_values("signal", signal(len)));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| {
                let mut cache = LodCache::new(3840.0);
                let level = cache
                    .level(&store, id, LevelKey::new(LodStep::COARSEST, Aggregation::Max))
                    .unwrap();
                black_box(level.len());
            });
        });
    }
    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    let values = signal(1_000_000);
    let world = Range::new(0.0, 3840.0);
    for span in [3840.0, 960.0, 60.0] {
        let window = Range::new(1000.0, 1000.0 + span).intersect(world).unwrap();
        let transform = Transform::new(window, 1920.0).unwrap();
        let params = ResampleParams {
            window,
            world,
            buffer_frac: 0.2,
            resolution: 1920,
            channel_height: 200.0,
            value_range: Range::new(-55.0, 55.0),
            aggregation: Aggregation::Max,
        };
        group.bench_with_input(BenchmarkId::from_parameter(span), &params, |b, params| {
            b.iter(|| black_box(resample(&values, params, &transform)));
        });
    }
    group.finish();
}

fn bench_simplify(c: &mut Criterion) {
    let points: Vec<ScreenPoint> = (0..1920)
        .map(|i| ScreenPoint::new(i as f32, (i as f32 * 0.05).sin() * 80.0 + 100.0))
        .collect();
    c.bench_function("simplify_1920", |b| {
        b.iter(|| black_box(simplify(&points, 0.5, false)));
    });
    c.bench_function("simplify_1920_high_quality", |b| {
        b.iter(|| black_box(simplify(&points, 0.5, true)));
    });
}

criterion_group!(benches, bench_level_build, bench_resample, bench_simplify);
criterion_main!(benches);
