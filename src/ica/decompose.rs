//! FastICA over the channels of an epoch tensor.
//!
//! The tensor is flattened to `X = [E · T, C]` (epochs concatenated along
//! time) and unmixed as
//!
//! ```text
//!   S = (X − μ) · Wᵀ              sources      [E · T, K]
//!   A = X_cᵀ · S · (SᵀS)⁻¹         mixing       [C, K]   (least squares)
//!   X_clean = X − S[:, excl] · A[:, excl]ᵀ
//! ```
//!
//! with `K = min(C, max_ica_components)`.  The fit is seeded, so the same
//! tensor and configuration always give the same decomposition.
use std::collections::BTreeSet;

use anyhow::anyhow;
use linfa::prelude::*;
use linfa_ica::fast_ica::FastIca;
use ndarray::{Array1, Array2, Axis};

use crate::config::PipelineConfig;
use crate::epoch::EpochTensor;
use crate::error::{PipelineError, Result};
use crate::features::statistical::kurtosis;

/// A fitted ICA model.  Never persisted; only the exclusion set changes after
/// fitting.
#[derive(Debug, Clone)]
pub struct IcaDecomposition {
    /// Per-channel mean removed before unmixing, `[C]`.
    pub mean: Array1<f64>,
    /// `[K, C]`.
    pub unmixing: Array2<f64>,
    /// `[C, K]`.
    pub mixing: Array2<f64>,
    exclude: BTreeSet<usize>,
}

/// Textual summary of one component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentSummary {
    pub index: usize,
    /// Excess kurtosis of the source time course; large values point to
    /// blinks and other spiky artifacts.
    pub kurtosis: f64,
    /// Share of the centred data variance carried by this component, in %.
    pub variance_pct: f64,
}

impl std::fmt::Display for ComponentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ICA{:03}  kurtosis {:>8.3}  variance {:>6.2} %",
            self.index, self.kurtosis, self.variance_pct
        )
    }
}

impl IcaDecomposition {
    /// Fit FastICA to `tensor`.
    ///
    /// Fails with a validation error when a channel is flat across the whole
    /// recording (it cannot be whitened) and with an internal error when the
    /// solver fails or produces non-finite values.
    pub fn fit(tensor: &EpochTensor, cfg: &PipelineConfig) -> Result<Self> {
        let x = tensor.to_samples();
        let (n_samples, n_channels) = x.dim();
        let n_components = cfg.ica_components(n_channels);
        if n_components == 0 || n_samples <= n_components {
            return Err(PipelineError::validation(format!(
                "ICA needs more samples than components, got {n_samples} samples and {n_channels} channels"
            )));
        }

        let mean = x.mean_axis(Axis(0)).ok_or_else(|| anyhow!("empty sample matrix"))?;
        let xc = &x - &mean.view().insert_axis(Axis(0));
        for (c, col) in xc.columns().into_iter().enumerate() {
            if col.iter().all(|&v| v == 0.0) {
                return Err(PipelineError::validation(format!(
                    "channel {} is flat across all epochs and cannot be unmixed",
                    tensor.ch_names[c]
                )));
            }
        }

        let model = FastIca::params()
            .ncomponents(n_components)
            .max_iter(cfg.ica_max_iter)
            .tol(cfg.ica_tolerance)
            .random_state(cfg.ica_seed)
            .fit(&DatasetBase::from(x.clone()))
            .map_err(|e| anyhow!("FastICA failed: {e}"))?;

        // The model is affine: probing it at μ + e_i yields row i of Wᵀ.
        let probe = Array2::<f64>::eye(n_channels) + &mean.view().insert_axis(Axis(0));
        let unmixing = model.predict(&probe).reversed_axes();

        let sources = xc.dot(&unmixing.t());
        let sts_inv = invert_matrix(&sources.t().dot(&sources))?;
        let mixing = xc.t().dot(&sources).dot(&sts_inv);

        if !unmixing.iter().chain(mixing.iter()).all(|v| v.is_finite()) {
            return Err(anyhow!("ICA produced non-finite unmixing or mixing coefficients").into());
        }

        Ok(Self { mean, unmixing, mixing, exclude: BTreeSet::new() })
    }

    pub fn n_components(&self) -> usize {
        self.unmixing.nrows()
    }

    pub fn exclude(&self) -> &BTreeSet<usize> {
        &self.exclude
    }

    /// Replace the exclusion set.  Every index must name a fitted component.
    pub fn set_exclude(&mut self, exclude: BTreeSet<usize>) -> Result<()> {
        if let Some(&bad) = exclude.iter().find(|&&i| i >= self.n_components()) {
            return Err(PipelineError::validation(format!(
                "artifact component {bad} does not exist (fitted {} components)",
                self.n_components()
            )));
        }
        self.exclude = exclude;
        Ok(())
    }

    /// Source time courses `[E · T, K]` of `tensor`.
    pub fn sources(&self, tensor: &EpochTensor) -> Array2<f64> {
        let xc = tensor.to_samples() - &self.mean.view().insert_axis(Axis(0));
        xc.dot(&self.unmixing.t())
    }

    /// Kurtosis and explained variance of every component on `tensor`.
    pub fn summaries(&self, tensor: &EpochTensor) -> Vec<ComponentSummary> {
        let xc = tensor.to_samples() - &self.mean.view().insert_axis(Axis(0));
        let total: f64 = xc.iter().map(|v| v * v).sum();
        let sources = xc.dot(&self.unmixing.t());
        (0..self.n_components())
            .map(|k| {
                let s = sources.column(k);
                let a = self.mixing.column(k);
                let energy = s.dot(&s) * a.dot(&a);
                ComponentSummary {
                    index: k,
                    kurtosis: kurtosis(&s.to_vec()),
                    variance_pct: if total > 0.0 { 100.0 * energy / total } else { 0.0 },
                }
            })
            .collect()
    }

    /// New tensor with the excluded components' contribution removed.
    ///
    /// With an empty exclusion set the data are returned unchanged.
    pub fn apply(&self, tensor: &EpochTensor) -> Result<EpochTensor> {
        if tensor.n_channels() != self.mixing.nrows() {
            return Err(PipelineError::validation(format!(
                "ICA was fitted on {} channels, tensor has {}",
                self.mixing.nrows(),
                tensor.n_channels()
            )));
        }
        if self.exclude.is_empty() {
            return Ok(tensor.clone());
        }
        let x = tensor.to_samples();
        let sources = self.sources(tensor);
        let excl: Vec<usize> = self.exclude.iter().copied().collect();
        let s_ex = sources.select(Axis(1), &excl);
        let a_ex = self.mixing.select(Axis(1), &excl);
        tensor.with_samples(&(x - s_ex.dot(&a_ex.t())))
    }
}

/// Gauss-Jordan inverse with partial pivoting.
fn invert_matrix(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let n = matrix.nrows();
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = matrix[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for i in 0..n {
        let pivot_row = (i..n)
            .max_by(|&a, &b| aug[[a, i]].abs().total_cmp(&aug[[b, i]].abs()))
            .unwrap_or(i);
        if pivot_row != i {
            for j in 0..2 * n {
                aug.swap([i, j], [pivot_row, j]);
            }
        }
        let pivot = aug[[i, i]];
        if pivot.abs() < 1e-12 {
            return Err(anyhow!("source covariance is singular; components are degenerate").into());
        }
        for j in 0..2 * n {
            aug[[i, j]] /= pivot;
        }
        for k in 0..n {
            if k != i {
                let factor = aug[[k, i]];
                if factor != 0.0 {
                    for j in 0..2 * n {
                        aug[[k, j]] -= factor * aug[[i, j]];
                    }
                }
            }
        }
    }

    Ok(aug.slice(ndarray::s![.., n..]).to_owned())
}
