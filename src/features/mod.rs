//! Per-channel, per-epoch feature extraction.
//!
//! Four families, each producing a fixed set of keys per channel:
//!
//! | family        | keys                                                   |
//! |---------------|--------------------------------------------------------|
//! | `statistical` | `{ch}_mean _std _max _min _kurtosis _skewness`         |
//! | `wavelet`     | `{ch}_wavelet_{j}_mean`, `{ch}_wavelet_{j}_std`, j=0..L |
//! | `psd`         | `{ch}_{delta,theta,alpha,beta,gamma}_power`            |
//! | `entropy`     | `{ch}_sample_entropy`, `{ch}_approx_entropy`           |
//!
//! Every value array is indexed by epoch.  Channels are processed in
//! parallel; results are merged in channel order.
pub mod entropy;
pub mod psd;
pub mod statistical;
pub mod wavelet;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use ndarray::Array1;
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::epoch::EpochTensor;
use crate::error::{PipelineError, Result};
use crate::io::{StFile, StWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum FeatureFamily {
    Statistical,
    Wavelet,
    Psd,
    Entropy,
}

impl FeatureFamily {
    pub const ALL: [FeatureFamily; 4] =
        [FeatureFamily::Statistical, FeatureFamily::Wavelet, FeatureFamily::Psd, FeatureFamily::Entropy];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureFamily::Statistical => "statistical",
            FeatureFamily::Wavelet => "wavelet",
            FeatureFamily::Psd => "psd",
            FeatureFamily::Entropy => "entropy",
        }
    }

    /// Key suffixes this family adds for each channel.
    pub fn names(&self, cfg: &PipelineConfig) -> Vec<String> {
        match self {
            FeatureFamily::Statistical => statistical::NAMES.iter().map(|s| s.to_string()).collect(),
            FeatureFamily::Wavelet => wavelet::names(cfg.wavelet_levels),
            FeatureFamily::Psd => psd::names(),
            FeatureFamily::Entropy => entropy::NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Values for one signal, ordered as [`names`](Self::names).
    fn values(&self, x: &[f64], fs: f64, cfg: &PipelineConfig) -> Result<Vec<f64>> {
        match self {
            FeatureFamily::Statistical => Ok(statistical::features(x).to_vec()),
            FeatureFamily::Wavelet => wavelet::features(x, cfg.wavelet_levels),
            FeatureFamily::Psd => psd::features(x, fs, cfg.welch_nperseg),
            FeatureFamily::Entropy => {
                Ok(entropy::features(x, cfg.entropy_order, cfg.entropy_tolerance)?.to_vec())
            }
        }
    }

    /// This family's `(key, per-epoch values)` pairs for `channel`.
    pub fn compute(
        &self,
        tensor: &EpochTensor,
        channel: usize,
        cfg: &PipelineConfig,
    ) -> Result<Vec<(String, Array1<f64>)>> {
        let ch = tensor.ch_names.get(channel).ok_or_else(|| {
            PipelineError::validation(format!("channel index {channel} out of range ({} channels)", tensor.n_channels()))
        })?;
        if tensor.n_times() == 0 {
            return Err(PipelineError::validation("cannot extract features from an empty time axis"));
        }
        let suffixes = self.names(cfg);
        let mut columns = vec![Vec::with_capacity(tensor.n_epochs()); suffixes.len()];
        for e in 0..tensor.n_epochs() {
            let x = tensor.signal(e, channel).to_vec();
            let values = self.values(&x, tensor.sfreq, cfg).map_err(|err| match err {
                PipelineError::Validation(msg) => {
                    PipelineError::validation(format!("{} features, channel {ch}, epoch {e}: {msg}", self.as_str()))
                }
                other => other,
            })?;
            for (col, v) in columns.iter_mut().zip(values) {
                col.push(v);
            }
        }
        Ok(suffixes
            .into_iter()
            .zip(columns)
            .map(|(suffix, col)| (format!("{ch}_{suffix}"), Array1::from(col)))
            .collect())
    }
}

impl std::fmt::Display for FeatureFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Feature matrix ───────────────────────────────────────────────────────────

/// Feature name → per-epoch values.  Every column has `n_epochs` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    pub n_epochs: usize,
    pub columns: BTreeMap<String, Array1<f64>>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Array1<f64>> {
        self.columns.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.columns.keys()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut w = StWriter::new();
        w.set_metadata("artifact", "feature_matrix");
        w.set_metadata("n_epochs", self.n_epochs.to_string());
        for (key, col) in &self.columns {
            w.add_f64(key, &col.to_vec(), &[col.len()]);
        }
        w.write(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let f = StFile::open(path)?;
        let n_epochs = f
            .metadata("n_epochs")
            .and_then(|v| v.parse::<usize>().ok())
            .ok_or_else(|| PipelineError::format(path, "missing `n_epochs` metadata"))?;
        let mut columns = BTreeMap::new();
        for name in f.names() {
            let (values, shape) = f.f64(name)?;
            if shape != [n_epochs] {
                return Err(PipelineError::format(
                    path,
                    format!("feature `{name}` has shape {shape:?}, expected [{n_epochs}]"),
                ));
            }
            columns.insert(name.clone(), Array1::from(values));
        }
        Ok(Self { n_epochs, columns })
    }
}

/// Extract the requested families for every channel of `tensor`.
///
/// Duplicate families are computed once.
pub fn extract_features(
    tensor: &EpochTensor,
    families: &[FeatureFamily],
    cfg: &PipelineConfig,
) -> Result<FeatureMatrix> {
    if tensor.n_times() == 0 {
        return Err(PipelineError::validation("cannot extract features from an empty time axis"));
    }
    let families: BTreeSet<FeatureFamily> = families.iter().copied().collect();
    let per_channel = (0..tensor.n_channels())
        .into_par_iter()
        .map(|c| {
            families
                .iter()
                .map(|fam| fam.compute(tensor, c, cfg))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let mut columns = BTreeMap::new();
    for (key, col) in per_channel.into_iter().flatten().flatten() {
        if columns.insert(key.clone(), col).is_some() {
            return Err(PipelineError::validation(format!("duplicate feature key `{key}` (repeated channel name?)")));
        }
    }
    Ok(FeatureMatrix { n_epochs: tensor.n_epochs(), columns })
}
