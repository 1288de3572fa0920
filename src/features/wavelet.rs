//! Multilevel discrete wavelet decomposition with Daubechies-4.
//!
//! One analysis step (filter length `F = 8`, input length `N`):
//!
//! ```text
//!   out_len = ⌊(N + F − 1) / 2⌋
//!   cA[o] = Σ_j dec_lo[j] · x̃[2o + 1 − j]
//!   cD[o] = Σ_j dec_hi[j] · x̃[2o + 1 − j]
//! ```
//!
//! where `x̃` is `x` extended by half-sample symmetry
//! (`… x₁ x₀ | x₀ x₁ … x_{N−1} | x_{N−1} x_{N−2} …`).  `levels` steps are
//! applied to successive approximations and the result is returned
//! approximation first: `[cA_L, cD_L, cD_{L−1}, …, cD_1]`.
use crate::error::{PipelineError, Result};

/// db4 decomposition lowpass.
const DB4_DEC_LO: [f64; 8] = [
    -0.010597401784997278,
    0.032883011666982945,
    0.030841381835986965,
    -0.18703481171888114,
    -0.02798376941698385,
    0.6308807679295904,
    0.7148465705525415,
    0.23037781330885523,
];

/// Quadrature mirror of [`DB4_DEC_LO`]: `hi[k] = (−1)^{k+1} · lo[F − 1 − k]`.
fn db4_dec_hi() -> [f64; 8] {
    let f = DB4_DEC_LO.len();
    std::array::from_fn(|k| {
        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        sign * DB4_DEC_LO[f - 1 - k]
    })
}

/// Index into a half-sample symmetric extension of a length-`n` signal.
fn symmetric_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        2 * n - 1 - m
    }
}

fn downsample_convolve(x: &[f64], filter: &[f64]) -> Vec<f64> {
    let n = x.len();
    let f = filter.len();
    let out_len = (n + f - 1) / 2;
    (0..out_len)
        .map(|o| {
            let i = (2 * o + 1) as isize;
            filter
                .iter()
                .enumerate()
                .map(|(j, h)| h * x[symmetric_index(i - j as isize, n)])
                .sum()
        })
        .collect()
}

/// Single-level transform: `(cA, cD)`.
pub fn dwt(x: &[f64]) -> (Vec<f64>, Vec<f64>) {
    (downsample_convolve(x, &DB4_DEC_LO), downsample_convolve(x, &db4_dec_hi()))
}

/// `levels`-level decomposition, approximation first.
pub fn wavedec(x: &[f64], levels: usize) -> Result<Vec<Vec<f64>>> {
    if x.is_empty() {
        return Err(PipelineError::validation("wavelet decomposition of an empty signal"));
    }
    if levels == 0 {
        return Err(PipelineError::validation("wavelet decomposition needs at least one level"));
    }
    let mut details = Vec::with_capacity(levels);
    let mut approx = x.to_vec();
    for _ in 0..levels {
        let (a, d) = dwt(&approx);
        details.push(d);
        approx = a;
    }
    let mut out = Vec::with_capacity(levels + 1);
    out.push(approx);
    out.extend(details.into_iter().rev());
    Ok(out)
}

/// Key suffixes `wavelet_{j}_mean` / `wavelet_{j}_std` for `j = 0..=levels`.
pub fn names(levels: usize) -> Vec<String> {
    (0..=levels)
        .flat_map(|j| [format!("wavelet_{j}_mean"), format!("wavelet_{j}_std")])
        .collect()
}

/// Mean and population std of every coefficient array, ordered as
/// [`names`].
pub fn features(x: &[f64], levels: usize) -> Result<Vec<f64>> {
    use super::statistical::{mean, std};
    Ok(wavedec(x, levels)?
        .iter()
        .flat_map(|c| [mean(c), std(c)])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn highpass_is_quadrature_mirror() {
        let hi = db4_dec_hi();
        assert_abs_diff_eq!(hi[0], -0.23037781330885523, epsilon = 1e-15);
        assert_abs_diff_eq!(hi[7], -0.010597401784997278, epsilon = 1e-15);
        assert_abs_diff_eq!(hi.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(DB4_DEC_LO.iter().sum::<f64>(), std::f64::consts::SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn coefficient_lengths_for_1000_samples() {
        let x: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.1).sin()).collect();
        let lens: Vec<usize> = wavedec(&x, 5).unwrap().iter().map(Vec::len).collect();
        assert_eq!(lens, vec![38, 38, 69, 131, 255, 503]);
    }

    #[test]
    fn constant_signal_has_no_detail() {
        let c = 3.0;
        let coeffs = wavedec(&[c; 250], 5).unwrap();
        for d in &coeffs[1..] {
            for &v in d {
                assert_abs_diff_eq!(v, 0.0, epsilon = 1e-9);
            }
        }
        for &v in &coeffs[0] {
            assert_abs_diff_eq!(v, c * std::f64::consts::SQRT_2.powi(5), epsilon = 1e-9);
        }
    }

    #[test]
    fn symmetric_extension_reflects_at_both_ends() {
        let idx: Vec<usize> = (-3..7).map(|i| symmetric_index(i, 4)).collect();
        assert_eq!(idx, vec![2, 1, 0, 0, 1, 2, 3, 3, 2, 1]);
    }

    #[test]
    fn feature_names_cover_every_level() {
        let n = names(5);
        assert_eq!(n.len(), 12);
        assert_eq!(n[0], "wavelet_0_mean");
        assert_eq!(n[11], "wavelet_5_std");
    }

    #[test]
    fn two_level_ramp_matches_reference_coefficients() {
        // pywt.wavedec(np.arange(16.0), 'db4', mode='symmetric', level=2)
        let x: Vec<f64> = (0..16).map(f64::from).collect();
        let expected: [&[f64]; 3] = [
            &[
                5.369520087855008,
                0.960871335639649,
                8.282545439866812,
                2.889099308680215,
                2.356184682502498,
                10.06251273773703,
                17.8164159101813,
                26.87884466406732,
                29.333699591240407,
            ],
            &[
                -0.42428701238675737,
                -1.134377422739678,
                0.9959242147851329,
                -0.3232461844647687,
                -0.01666491697845613,
                0.6455375001886607,
                -1.0145386228191104,
                0.34056861809674044,
                0.03020714698235527,
            ],
            &[
                0.023713130626965923,
                0.04096208639595622,
                -0.06467521702296496,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                -0.02371313062696767,
                -0.04096208639595694,
                0.06467521702296511,
            ],
        ];
        let coeffs = wavedec(&x, 2).unwrap();
        assert_eq!(coeffs.len(), 3);
        for (got, want) in coeffs.iter().zip(expected) {
            assert_eq!(got.len(), want.len());
            for (g, w) in got.iter().zip(want) {
                assert_abs_diff_eq!(*g, *w, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn interior_impulse_reproduces_the_filter() {
        // cA[o] = lo[2o + 1 − k] for an impulse at k away from the edges
        let mut x = vec![0.0; 32];
        x[16] = 1.0;
        let (ca, cd) = dwt(&x);
        let hi = db4_dec_hi();
        for (o, j) in [(8, 1), (9, 3), (10, 5), (11, 7)] {
            assert_abs_diff_eq!(ca[o], DB4_DEC_LO[j], epsilon = 1e-15);
            assert_abs_diff_eq!(cd[o], hi[j], epsilon = 1e-15);
        }
        assert_abs_diff_eq!(ca[7], 0.0);
        assert_abs_diff_eq!(ca[12], 0.0);
    }

    #[test]
    fn empty_signal_is_rejected() {
        assert!(wavedec(&[], 5).is_err());
    }
}
