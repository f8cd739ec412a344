use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use epochset::transform::window::FilterWindowTransformer;
use epochset::transform::{Transform, WindowPipeline};
use epochset::{DatasetConfig, SyntheticSource, ZscoreWindowTransformer};
use ndarray::Array2;

fn bench_window_chain(c: &mut Criterion) {
    let chain = WindowPipeline::empty()
        .step("FIR_filter", FilterWindowTransformer::new(250.0, Some(8.0), Some(12.0)).unwrap()).unwrap()
        .step("zscorer", ZscoreWindowTransformer).unwrap();
    let x = Array2::from_shape_fn((22, 200), |(ch, t)| ((ch * 7 + t) % 19) as f32);
    c.bench_function("window chain [22×200] FIR 8–12 Hz + zscore", |b| {
        b.iter(|| black_box(chain.transform(black_box(x.clone())).unwrap()))
    });
}

fn bench_get(c: &mut Criterion) {
    let source = SyntheticSource::default();
    let online = DatasetConfig::default().builder().unwrap().build(&source).unwrap();
    let offline = DatasetConfig { transform_online: false, ..DatasetConfig::default() }
        .builder().unwrap()
        .build(&source).unwrap();

    c.bench_function("get(i) online", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % online.len();
            black_box(online.get(black_box(i)).unwrap().0[[0, 0]])
        })
    });
    c.bench_function("get(i) precomputed", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % offline.len();
            black_box(offline.get(black_box(i)).unwrap().0[[0, 0]])
        })
    });
}

fn bench_build(c: &mut Criterion) {
    let source = SyntheticSource::default();
    let cfg = DatasetConfig::default();
    let mut group = c.benchmark_group("build");
    group.sample_size(10);
    group.bench_function("subject 2, 240 windows, online", |b| {
        b.iter(|| black_box(cfg.builder().unwrap().build(&source).unwrap().len()))
    });
    group.finish();
}

criterion_group!(benches, bench_window_chain, bench_get, bench_build);
criterion_main!(benches);
