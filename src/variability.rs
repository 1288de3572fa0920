//! Band-power variability across channels.
//!
//! For each of the first `max_epochs` epochs and each band: the mean Welch
//! density inside the band per channel, then the sample standard deviation
//! (`ddof = 1`) of those values across channels.  Averaging over epochs gives
//! one variability figure per band; `max_var_band` is the largest.
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::epoch::EpochTensor;
use crate::error::{PipelineError, Result};
use crate::features::psd::{welch, BANDS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariabilityReport {
    pub max_var_band: String,
    pub variability: BTreeMap<String, f64>,
}

fn sample_std(v: &[f64]) -> f64 {
    if v.len() < 2 {
        return 0.0;
    }
    let mu = v.iter().sum::<f64>() / v.len() as f64;
    (v.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / (v.len() - 1) as f64).sqrt()
}

/// Compute the report over the first `cfg.variability_max_epochs` epochs.
pub fn band_variability(tensor: &EpochTensor, cfg: &PipelineConfig) -> Result<VariabilityReport> {
    let n_epochs = tensor.n_epochs().min(cfg.variability_max_epochs);
    if n_epochs == 0 || tensor.n_channels() == 0 {
        return Err(PipelineError::validation("variability needs at least one epoch and one channel"));
    }

    // band_means[e][c][b]
    let band_means = (0..n_epochs)
        .into_par_iter()
        .map(|e| {
            (0..tensor.n_channels())
                .map(|c| {
                    let spectrum = welch(&tensor.signal(e, c).to_vec(), tensor.sfreq, cfg.welch_nperseg)?;
                    Ok(BANDS.iter().map(|&(_, lo, hi)| spectrum.band_mean(lo, hi)).collect::<Vec<f64>>())
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let mut variability = BTreeMap::new();
    let mut best: Option<(&str, f64)> = None;
    for (b, &(band, _, _)) in BANDS.iter().enumerate() {
        let per_epoch: Vec<f64> = band_means
            .iter()
            .map(|chans| sample_std(&chans.iter().map(|v| v[b]).collect::<Vec<_>>()))
            .collect();
        let value = per_epoch.iter().sum::<f64>() / per_epoch.len() as f64;
        if best.map_or(true, |(_, v)| value > v) {
            best = Some((band, value));
        }
        variability.insert(band.to_string(), value);
    }
    let max_var_band = best.map(|(b, _)| b.to_string()).unwrap_or_default();
    Ok(VariabilityReport { max_var_band, variability })
}

impl VariabilityReport {
    /// Write as indented JSON (atomically).
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).context("serialising variability report")?;
        crate::io::write_atomic(path, |w| std::io::Write::write_all(w, &json))
    }
}
