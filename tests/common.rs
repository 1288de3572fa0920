/// Shared helpers: synthetic device exports and epoch tensors.
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use eegpipe::{EpochTensor, EventMarker, RawRecord};
use ndarray::{Array2, Array3};

#[allow(unused)]
pub const CHANNELS: [&str; 4] = ["AF3", "F7", "O1", "O2"];

/// Deterministic uniform noise in [-0.5, 0.5).
#[allow(unused)]
pub struct Lcg(u64);

#[allow(unused)]
impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn sample(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 11) as f64 / (1u64 << 53) as f64) - 0.5
    }
}

#[allow(unused)]
pub fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
    (0..n).map(|t| (2.0 * PI * freq * t as f64 / fs).sin()).collect()
}

/// Three independent sources mixed into four channels, in device counts.
/// `sample` is the global sample index so consecutive events continue the
/// same waveforms.
#[allow(unused)]
fn mixed(channel: usize, sample: usize, fs: f64, noise: f64) -> f64 {
    let t = sample as f64 / fs;
    let s1 = (2.0 * PI * 10.0 * t).sin();
    let s2 = if (2.0 * PI * 3.0 * t).sin() >= 0.0 { 1.0 } else { -1.0 };
    let s3 = (2.0 * PI * 25.0 * t).cos().powi(3);
    let w = [[1.0, 0.5, 0.2], [0.3, 1.0, 0.1], [0.2, -0.4, 1.0], [0.6, 0.2, -0.5]][channel];
    400.0 * (w[0] * s1 + w[1] * s2 + w[2] * s3) + 20.0 * noise
}

/// Text of a raw export: `n_events` events × [`CHANNELS`], every record
/// `size` samples long (the device reports `size = 2 · sfreq`).
#[allow(unused)]
pub fn export_text(n_events: usize, size: usize) -> String {
    let fs = size as f64 / 2.0;
    let mut rng = Lcg::new(7);
    let mut out = String::new();
    let mut id = 1000;
    for e in 0..n_events {
        let event = 500 + e as i64;
        let code = (e % 2) as i64;
        for (c, ch) in CHANNELS.iter().enumerate() {
            let samples: Vec<String> = (0..size)
                .map(|t| format!("{:.6}", mixed(c, e * size + t, fs, rng.sample())))
                .collect();
            out.push_str(&format!("{id}\t{event}\tEP\t{ch}\t{code}\t{size}\t{}\n", samples.join(",")));
            id += 1;
        }
    }
    out
}

#[allow(unused)]
pub fn write_export(dir: &Path, name: &str, n_events: usize, size: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, export_text(n_events, size)).unwrap();
    path
}

#[allow(unused)]
pub fn record(event: i64, channel: &str, code: i64, signal: Vec<f64>) -> RawRecord {
    RawRecord { id: 0, event, channel: channel.into(), code, size: signal.len(), signal }
}

/// Epoch tensor from a `[E, C, T]` generator, with no positions or projectors.
#[allow(unused)]
pub fn tensor<F>(n_epochs: usize, channels: &[&str], n_times: usize, sfreq: f64, f: F) -> EpochTensor
where
    F: Fn(usize, usize, usize) -> f64,
{
    let data = Array3::from_shape_fn((n_epochs, channels.len(), n_times), |(e, c, t)| f(e, c, t));
    EpochTensor {
        data,
        ch_names: channels.iter().map(|s| s.to_string()).collect(),
        sfreq,
        chan_pos: Array2::zeros((channels.len(), 3)),
        events: (0..n_epochs)
            .map(|e| EventMarker { onset: e * n_times, event: e as i64, class_id: 0 })
            .collect(),
        event_codes: vec![0],
        projectors: Vec::new(),
    }
}
