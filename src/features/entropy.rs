//! Sample entropy and approximate entropy.
//!
//! Both embed `x` into templates of length `m` and `m + 1` and count pairs
//! within tolerance `r = tolerance · std(x)` under the Chebyshev (max-abs)
//! distance.
//!
//! Sample entropy uses the first `N − m` templates for both lengths, strict
//! `d < r`, and only distinct pairs `i < j`:
//!
//! ```text
//!   SampEn = −ln(A / B)     B = #m-matches, A = #(m+1)-matches
//! ```
//!
//! Approximate entropy uses all `N − k + 1` templates of length `k`,
//! `d ≤ r`, and counts each template against itself:
//!
//! ```text
//!   φ_k   = mean_i ln(C_i / (N − k + 1))
//!   ApEn  = φ_m − φ_{m+1}
//! ```
use crate::error::{PipelineError, Result};
use crate::features::statistical::std;

pub const NAMES: [&str; 2] = ["sample_entropy", "approx_entropy"];

fn chebyshev_within(x: &[f64], i: usize, j: usize, len: usize, r: f64, strict: bool) -> bool {
    for k in 0..len {
        let d = (x[i + k] - x[j + k]).abs();
        if (strict && d >= r) || (!strict && d > r) {
            return false;
        }
    }
    true
}

fn check_len(x: &[f64], order: usize) -> Result<()> {
    if order == 0 {
        return Err(PipelineError::validation("entropy embedding order must be at least 1"));
    }
    if x.len() < order + 2 {
        return Err(PipelineError::validation(format!(
            "entropy of order {order} needs at least {} samples, got {}",
            order + 2,
            x.len()
        )));
    }
    Ok(())
}

/// Sample entropy.
///
/// Returns `0.0` when no template pair matches at length `m` (for example a
/// constant signal, where `r = 0`), and `+∞` when pairs match at `m` but none
/// at `m + 1`.
pub fn sample_entropy(x: &[f64], order: usize, tolerance: f64) -> Result<f64> {
    check_len(x, order)?;
    let r = tolerance * std(x);
    let n_templates = x.len() - order;
    let (mut a, mut b) = (0u64, 0u64);
    for i in 0..n_templates {
        for j in i + 1..n_templates {
            if chebyshev_within(x, i, j, order, r, true) {
                b += 1;
                if (x[i + order] - x[j + order]).abs() < r {
                    a += 1;
                }
            }
        }
    }
    if b == 0 {
        return Ok(0.0);
    }
    Ok(-(a as f64 / b as f64).ln())
}

fn phi(x: &[f64], len: usize, r: f64) -> f64 {
    let n = x.len() - len + 1;
    let mut total = 0.0;
    for i in 0..n {
        let count = (0..n).filter(|&j| chebyshev_within(x, i, j, len, r, false)).count();
        total += (count as f64 / n as f64).ln();
    }
    total / n as f64
}

/// Approximate entropy.  Always finite: every template matches itself.
pub fn approx_entropy(x: &[f64], order: usize, tolerance: f64) -> Result<f64> {
    check_len(x, order)?;
    let r = tolerance * std(x);
    Ok(phi(x, order, r) - phi(x, order + 1, r))
}

/// `[sample_entropy, approx_entropy]`, ordered as [`NAMES`].
pub fn features(x: &[f64], order: usize, tolerance: f64) -> Result<[f64; 2]> {
    Ok([sample_entropy(x, order, tolerance)?, approx_entropy(x, order, tolerance)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn periodic_signal_is_more_regular_than_scrambled() {
        let periodic: Vec<f64> = (0..300).map(|i| (i as f64 * 0.5).sin()).collect();
        let mut state: u64 = 97;
        let scrambled: Vec<f64> = (0..300)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
            })
            .collect();
        let se_p = sample_entropy(&periodic, 2, 0.2).unwrap();
        let se_s = sample_entropy(&scrambled, 2, 0.2).unwrap();
        assert!(se_p < se_s, "{se_p} vs {se_s}");
        let ap_p = approx_entropy(&periodic, 2, 0.2).unwrap();
        let ap_s = approx_entropy(&scrambled, 2, 0.2).unwrap();
        assert!(ap_p < ap_s, "{ap_p} vs {ap_s}");
    }

    #[test]
    fn constant_signal_is_finite() {
        let x = [4.0; 50];
        assert_eq!(sample_entropy(&x, 2, 0.2).unwrap(), 0.0);
        assert_abs_diff_eq!(approx_entropy(&x, 2, 0.2).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn hand_counted_sample_entropy() {
        // x = [0, 1, 0, 1, 0, 1], std = 0.5, r = 0.5 · 2.0 = 1.0 (tolerance 2).
        // m = 2: templates (0,1) (1,0) (0,1) (1,0); strict d < 1 matches
        //   only identical ones: pairs (0,2) (1,3) → B = 2.
        // m + 1: (0,1,0) (1,0,1) (0,1,0) (1,0,1) → pairs (0,2) (1,3) → A = 2.
        let x = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        assert_abs_diff_eq!(sample_entropy(&x, 2, 2.0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn too_short_signal_is_rejected() {
        assert!(sample_entropy(&[1.0, 2.0, 3.0], 2, 0.2).is_err());
        assert!(approx_entropy(&[], 2, 0.2).is_err());
    }
}
