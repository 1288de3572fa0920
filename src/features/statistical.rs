//! Per-epoch summary statistics.
//!
//! All moments are the biased (population) estimators:
//!
//! ```text
//!   m_k      = mean((x − x̄)^k)
//!   std      = √m₂
//!   skewness = m₃ / m₂^{3/2}
//!   kurtosis = m₄ / m₂² − 3        (Fisher / excess)
//! ```
//!
//! A constant signal has zero skewness and kurtosis rather than NaN.

/// Key suffixes in output order.
pub const NAMES: [&str; 6] = ["mean", "std", "max", "min", "kurtosis", "skewness"];

pub fn mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

/// Central moment `m_k`.
fn central_moment(x: &[f64], mu: f64, k: i32) -> f64 {
    x.iter().map(|v| (v - mu).powi(k)).sum::<f64>() / x.len() as f64
}

/// Population standard deviation (`ddof = 0`).
pub fn std(x: &[f64]) -> f64 {
    central_moment(x, mean(x), 2).sqrt()
}

pub fn kurtosis(x: &[f64]) -> f64 {
    let mu = mean(x);
    let m2 = central_moment(x, mu, 2);
    if m2 == 0.0 {
        return 0.0;
    }
    central_moment(x, mu, 4) / (m2 * m2) - 3.0
}

pub fn skewness(x: &[f64]) -> f64 {
    let mu = mean(x);
    let m2 = central_moment(x, mu, 2);
    if m2 == 0.0 {
        return 0.0;
    }
    central_moment(x, mu, 3) / m2.powf(1.5)
}

/// Values for [`NAMES`], in the same order.  `x` must be non-empty.
pub fn features(x: &[f64]) -> [f64; 6] {
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = x.iter().copied().fold(f64::INFINITY, f64::min);
    [mean(x), std(x), max, min, kurtosis(x), skewness(x)]
}
