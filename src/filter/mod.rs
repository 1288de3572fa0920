//! Butterworth bandpass design and zero-phase application.
//!
//! - [`design`]: cutoff validation against Nyquist and SOS design.
//! - [`apply`]: forward-backward filtering per signal and per table.

pub mod apply;
pub mod design;

pub use apply::{bandpass_filter, filter_table, filtfilt};
pub use design::{design_butter_bandpass, normalized_band, Bandpass};
