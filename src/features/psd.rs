//! Welch power spectral density and band power.
//!
//! For a signal of `N` samples at `fs` Hz:
//!   • `nperseg = min(welch_nperseg, N)`, `noverlap = nperseg / 2`
//!   • periodic Hann window `w[i] = 0.5 − 0.5 · cos(2πi / nperseg)`
//!   • each segment: subtract its mean, apply `w`, FFT
//!   • `P[k] = |X[k]|² / (fs · Σw²)`, doubled for `0 < k < nperseg/2`
//!     (and for the last bin too when `nperseg` is odd)
//!   • segment spectra averaged; `freqs[k] = k · fs / nperseg`
//!
//! Band power sums `P` over bins with `lo ≤ f ≤ hi`.
use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{PipelineError, Result};

/// Canonical EEG bands `(name, lo Hz, hi Hz)`.
pub const BANDS: [(&str, f64, f64); 5] = [
    ("delta", 0.5, 4.0),
    ("theta", 4.0, 8.0),
    ("alpha", 8.0, 13.0),
    ("beta", 13.0, 30.0),
    ("gamma", 30.0, 45.0),
];

/// One-sided PSD estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub freqs: Vec<f64>,
    /// Power density in µV² / Hz.
    pub psd: Vec<f64>,
}

impl Spectrum {
    /// Bins with `lo ≤ f ≤ hi`.
    fn band(&self, lo: f64, hi: f64) -> impl Iterator<Item = f64> + '_ {
        self.freqs
            .iter()
            .zip(&self.psd)
            .filter(move |(f, _)| **f >= lo && **f <= hi)
            .map(|(_, p)| *p)
    }

    /// Sum of the density over `[lo, hi]`.
    pub fn band_sum(&self, lo: f64, hi: f64) -> f64 {
        self.band(lo, hi).sum()
    }

    /// Mean density over `[lo, hi]`, `0.0` if no bin falls inside.
    pub fn band_mean(&self, lo: f64, hi: f64) -> f64 {
        let (sum, n) = self.band(lo, hi).fold((0.0, 0usize), |(s, n), p| (s + p, n + 1));
        if n == 0 {
            0.0
        } else {
            sum / n as f64
        }
    }
}

fn hann_periodic(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos())
        .collect()
}

/// Welch estimate of `x` sampled at `fs` with segments of at most
/// `nperseg` samples.
pub fn welch(x: &[f64], fs: f64, nperseg: usize) -> Result<Spectrum> {
    if x.is_empty() {
        return Err(PipelineError::validation("power spectrum of an empty signal"));
    }
    if nperseg == 0 || !(fs > 0.0) {
        return Err(PipelineError::validation(format!(
            "invalid Welch parameters: nperseg={nperseg}, fs={fs}"
        )));
    }
    let nperseg = nperseg.min(x.len());
    let noverlap = nperseg / 2;
    let step = nperseg - noverlap;
    let n_segments = (x.len() - nperseg) / step + 1;

    let window = hann_periodic(nperseg);
    let scale = 1.0 / (fs * window.iter().map(|w| w * w).sum::<f64>());
    let n_bins = nperseg / 2 + 1;

    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fft = planner.plan_fft_forward(nperseg);
    let mut acc = vec![0.0; n_bins];
    let mut buf = vec![Complex::default(); nperseg];

    for seg in 0..n_segments {
        let chunk = &x[seg * step..seg * step + nperseg];
        let mu = chunk.iter().sum::<f64>() / nperseg as f64;
        for ((b, &v), &w) in buf.iter_mut().zip(chunk).zip(&window) {
            *b = Complex { re: (v - mu) * w, im: 0.0 };
        }
        fft.process(&mut buf);
        for (a, b) in acc.iter_mut().zip(&buf) {
            *a += b.norm_sqr() * scale;
        }
    }

    // One-sided: double everything except DC and (for even lengths) Nyquist.
    let last = if nperseg % 2 == 0 { n_bins - 1 } else { n_bins };
    for (k, a) in acc.iter_mut().enumerate() {
        *a /= n_segments as f64;
        if k > 0 && k < last {
            *a *= 2.0;
        }
    }

    let freqs = (0..n_bins).map(|k| k as f64 * fs / nperseg as f64).collect();
    Ok(Spectrum { freqs, psd: acc })
}

/// Key suffixes `{band}_power`, in [`BANDS`] order.
pub fn names() -> Vec<String> {
    BANDS.iter().map(|(b, _, _)| format!("{b}_power")).collect()
}

/// Band powers of `x`, ordered as [`names`].
pub fn features(x: &[f64], fs: f64, nperseg: usize) -> Result<Vec<f64>> {
    let spectrum = welch(x, fs, nperseg)?;
    Ok(BANDS.iter().map(|&(_, lo, hi)| spectrum.band_sum(lo, hi)).collect())
}
