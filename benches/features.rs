use std::f64::consts::PI;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use eegpipe::features::{entropy, psd, wavelet};
use eegpipe::filter::bandpass_filter;
use eegpipe::{extract_features, EpochTensor, EventMarker, FeatureFamily, PipelineConfig};
use ndarray::{Array2, Array3};

fn signal(n: usize, fs: f64) -> Vec<f64> {
    (0..n)
        .map(|t| {
            let t = t as f64 / fs;
            (2.0 * PI * 10.0 * t).sin() + 0.5 * (2.0 * PI * 23.0 * t).sin() + 0.1 * (t * 997.0).sin()
        })
        .collect()
}

fn bench_bandpass(c: &mut Criterion) {
    let cfg = PipelineConfig::default();
    let x = signal(260, 260.0);
    c.bench_function("bandpass_filter 260 samples (1–60 Hz, order 5)", |b| {
        b.iter(|| black_box(bandpass_filter(black_box(&x), 260.0, &cfg).unwrap().len()))
    });
}

fn bench_single_signal(c: &mut Criterion) {
    let x = signal(260, 130.0);
    c.bench_function("welch nperseg=248", |b| {
        b.iter(|| black_box(psd::welch(black_box(&x), 130.0, 248).unwrap().psd[0]))
    });
    c.bench_function("wavedec db4 level 5", |b| {
        b.iter(|| black_box(wavelet::wavedec(black_box(&x), 5).unwrap().len()))
    });
    c.bench_function("sample + approximate entropy", |b| {
        b.iter(|| black_box(entropy::features(black_box(&x), 2, 0.2).unwrap()))
    });
}

fn bench_extract_all(c: &mut Criterion) {
    let (n_e, n_c, n_t) = (20, 14, 260);
    let x = signal(n_t, 130.0);
    let tensor = EpochTensor {
        data: Array3::from_shape_fn((n_e, n_c, n_t), |(e, ch, t)| x[t] * (1.0 + 0.1 * ch as f64) + e as f64),
        ch_names: (0..n_c).map(|i| format!("E{i}")).collect(),
        sfreq: 130.0,
        chan_pos: Array2::zeros((n_c, 3)),
        events: (0..n_e).map(|e| EventMarker { onset: e * n_t, event: e as i64, class_id: 0 }).collect(),
        event_codes: vec![0],
        projectors: Vec::new(),
    };
    let cfg = PipelineConfig::default();
    c.bench_function("extract_features all families [20×14×260]", |b| {
        b.iter(|| black_box(extract_features(&tensor, &FeatureFamily::ALL, &cfg).unwrap().len()))
    });
}

criterion_group!(benches, bench_bandpass, bench_single_signal, bench_extract_all);
criterion_main!(benches);
