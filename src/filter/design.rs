//! Butterworth bandpass design.
//!
//! For a bandpass `[lowcut, highcut]` Hz at sampling rate `fs`:
//!   • nyquist      = 0.5 · fs
//!   • normalised   = (lowcut / nyquist, highcut / nyquist), both in (0, 1)
//!   • design       = `butter(order, [low, high], btype='band')` in
//!                    second-order sections (one section per pole pair)
//!
//! Returning SOS instead of `(b, a)` keeps order-5 bandpass designs stable at
//! low normalised cutoffs, where the transfer-function form loses precision.
use sci_rs::signal::filter::design::{
    butter_dyn, DigitalFilter, FilterBandType, FilterOutputType, Sos, SosFormatFilter,
};

use crate::error::{PipelineError, Result};

/// Validated bandpass parameters for one sampling rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bandpass {
    pub lowcut: f64,
    pub highcut: f64,
    pub fs: f64,
    pub order: usize,
}

impl Bandpass {
    /// Check the cutoffs against Nyquist.
    ///
    /// Fails with a validation error if either normalised edge falls outside
    /// the open interval (0, 1) or the band is empty.
    pub fn new(lowcut: f64, highcut: f64, fs: f64, order: usize) -> Result<Self> {
        if !(fs.is_finite() && fs > 0.0) {
            return Err(PipelineError::validation(format!("sampling rate must be positive, got {fs}")));
        }
        if order == 0 {
            return Err(PipelineError::validation("filter order must be at least 1"));
        }
        let (low, high) = normalized_band(lowcut, highcut, fs);
        if !(low > 0.0 && low < 1.0 && high > 0.0 && high < 1.0) {
            return Err(PipelineError::validation(format!(
                "cutoffs {lowcut}–{highcut} Hz normalise to ({low:.4}, {high:.4}) at fs={fs} Hz; \
                 both must lie strictly between 0 and 1"
            )));
        }
        if low >= high {
            return Err(PipelineError::validation(format!(
                "lowcut ({lowcut} Hz) must be below highcut ({highcut} Hz)"
            )));
        }
        Ok(Self { lowcut, highcut, fs, order })
    }

    /// Second-order sections of the digital Butterworth bandpass.
    pub fn design(&self) -> Result<Vec<Sos<f64>>> {
        design_butter_bandpass(self.order, self.lowcut, self.highcut, self.fs)
    }
}

/// `(lowcut / nyquist, highcut / nyquist)`.
pub fn normalized_band(lowcut: f64, highcut: f64, fs: f64) -> (f64, f64) {
    let nyquist = 0.5 * fs;
    (lowcut / nyquist, highcut / nyquist)
}

/// Design a digital Butterworth bandpass as second-order sections.
///
/// Call through [`Bandpass::design`] so the cutoffs are validated first; the
/// underlying designer does not report invalid edges gracefully.
pub fn design_butter_bandpass(order: usize, lowcut: f64, highcut: f64, fs: f64) -> Result<Vec<Sos<f64>>> {
    let filter = butter_dyn(
        order,
        vec![lowcut, highcut],
        Some(FilterBandType::Bandpass),
        Some(false),
        Some(FilterOutputType::Sos),
        Some(fs),
    );
    let DigitalFilter::Sos(SosFormatFilter { sos }) = filter else {
        return Err(PipelineError::Internal(anyhow::anyhow!(
            "Butterworth designer did not return second-order sections"
        )));
    };
    Ok(sos)
}
