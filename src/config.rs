//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter of the six stages.  All
//! fields have defaults that match the settings used for the research runs on
//! the 14-channel consumer headset recordings.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Configuration for the full EEG pipeline.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use eegpipe::PipelineConfig;
///
/// let cfg = PipelineConfig {
///     highcut:      45.0,   // tighter lowpass edge
///     filter_order: 4,
///     ..PipelineConfig::default()
/// };
/// assert_eq!(cfg.lowcut, 1.0);
/// ```
///
/// Binaries also accept a JSON file (`--config`); missing keys keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Multiplier turning raw device counts into microvolts.
    ///
    /// This is the least-significant-bit resolution of the headset ADC, a
    /// property of the hardware and not something estimated from data.
    ///
    /// Default: `0.125` µV / count.
    pub conversion_factor: f64,

    /// Number of leading rows kept by ingestion in mock mode.
    ///
    /// Default: `10_000`.
    pub mock_rows: usize,

    /// Lower passband edge of the Butterworth bandpass in Hz.
    ///
    /// Default: `1.0` Hz.
    pub lowcut: f64,

    /// Upper passband edge of the Butterworth bandpass in Hz.
    ///
    /// Must stay below Nyquist (`size / 2`) for every record.
    ///
    /// Default: `60.0` Hz.
    pub highcut: f64,

    /// Butterworth prototype order (per band edge).
    ///
    /// Default: `5`.
    pub filter_order: usize,

    /// Upper bound on the number of ICA components.  The fitted model uses
    /// `min(n_channels, max_ica_components)`.
    ///
    /// Default: `20`.
    pub max_ica_components: usize,

    /// FastICA iteration cap.
    ///
    /// Default: `800`.
    pub ica_max_iter: usize,

    /// FastICA convergence tolerance.
    ///
    /// Default: `1e-4`.
    pub ica_tolerance: f64,

    /// Seed for the FastICA initial unmixing matrix.  Fixed so the
    /// decomposition is reproducible run to run.
    ///
    /// Default: `97`.
    pub ica_seed: usize,

    /// Welch segment length in samples.  Shorter epochs use their full
    /// length as a single segment.
    ///
    /// Default: `248`.
    pub welch_nperseg: usize,

    /// Number of discrete wavelet decomposition levels.
    ///
    /// Default: `5` (six coefficient arrays).
    pub wavelet_levels: usize,

    /// Embedding dimension for sample / approximate entropy.
    ///
    /// Default: `2`.
    pub entropy_order: usize,

    /// Entropy tolerance as a fraction of the signal's standard deviation.
    ///
    /// Default: `0.2`.
    pub entropy_tolerance: f64,

    /// Number of leading epochs used by the band-variability report.
    ///
    /// Default: `100`.
    pub variability_max_epochs: usize,

    /// File name of the empty artifact-config placeholder created when the
    /// ICA stage runs with neither interactive nor file-driven marking.
    /// Resolved against the execution context root.
    ///
    /// Default: `"artifacts.txt"`.
    pub artifact_placeholder: String,
}

impl Default for PipelineConfig {
    /// Returns the research configuration:
    /// 0.125 µV/count · 1–60 Hz order-5 bandpass · ≤ 20 ICA components.
    fn default() -> Self {
        Self {
            conversion_factor: 0.125,
            mock_rows: 10_000,
            lowcut: 1.0,
            highcut: 60.0,
            filter_order: 5,
            max_ica_components: 20,
            ica_max_iter: 800,
            ica_tolerance: 1e-4,
            ica_seed: 97,
            welch_nperseg: 248,
            wavelet_levels: 5,
            entropy_order: 2,
            entropy_tolerance: 0.2,
            variability_max_epochs: 100,
            artifact_placeholder: "artifacts.txt".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file.  Keys that are not present keep
    /// their default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| PipelineError::format(path, e.to_string()))
    }

    /// Number of ICA components for a recording with `n_channels` channels.
    ///
    /// ```
    /// use eegpipe::PipelineConfig;
    /// let cfg = PipelineConfig::default();
    /// assert_eq!(cfg.ica_components(14), 14);
    /// assert_eq!(cfg.ica_components(64), 20);
    /// ```
    pub fn ica_components(&self, n_channels: usize) -> usize {
        n_channels.min(self.max_ica_components)
    }
}
