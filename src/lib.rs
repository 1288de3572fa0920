//! # eegpipe — EEG signal conditioning and feature extraction
//!
//! `eegpipe` turns raw tab-separated EEG device exports into a denoised,
//! re-referenced epoch collection and a fixed-width feature matrix.  Each
//! step is a library function and a standalone binary; between binaries the
//! data travel as safetensors files.
//!
//! ## Pipeline overview
//!
//! ```text
//! raw export (.txt)
//!   │
//!   ├─ ingest              7-field TSV parser, counts × 0.125 → µV
//!   ├─ filter              Butterworth 1–60 Hz, order 5, sosfiltfilt (zero phase)
//!   ├─ truncate            every record cut to min(size)
//!   ├─ epoch               [E, C, T] tensor, missing channels zero-padded
//!   ├─ ica                 FastICA (≤ 20 comps, seed 97), marked comps removed
//!   ├─ reference           common-average projector, applied once
//!   └─ features            statistical · db4 wavelet · Welch band power · entropy
//!        │
//!        └─→ FeatureMatrix  "{channel}_{feature}" → [n_epochs] f64
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use std::path::Path;
//! use eegpipe::{extract_features, ingest::load_export, preprocess, FeatureFamily, PipelineConfig};
//!
//! let cfg   = PipelineConfig::default();
//! let table = load_export(Path::new("data/raw.txt"), cfg.conversion_factor, None).unwrap();
//!
//! // Filter, truncate, epoch, remove ICA components 0 and 3, re-reference.
//! let exclude: BTreeSet<usize> = [0, 3].into_iter().collect();
//! let epochs = preprocess(&table, &exclude, &cfg).unwrap();
//!
//! let features = extract_features(&epochs, &FeatureFamily::ALL, &cfg).unwrap();
//! for key in features.keys().take(5) {
//!     println!("{key}: {:?}", features.get(key).unwrap());
//! }
//! ```
//!
//! ## Running individual stages
//!
//! The [`stages`] module runs one step from file to file, exactly as the
//! binaries do:
//!
//! ```no_run
//! use std::path::Path;
//! use eegpipe::{stages, Context, PipelineConfig};
//!
//! let ctx = Context::new("load_data", "/data/run1");
//! let cfg = PipelineConfig::default();
//! stages::load_data(&ctx, Path::new("raw.txt"), Path::new("table.safetensors"), &cfg, false).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod epoch;
pub mod error;
pub mod features;
pub mod filter;
pub mod ica;
pub mod ingest;
pub mod io;
pub mod montage;
pub mod reference;
pub mod stages;
pub mod table;
pub mod truncate;
pub mod variability;

use std::collections::BTreeSet;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use config::PipelineConfig;
pub use context::Context;
pub use epoch::{assemble_epochs, AssemblyReport, EpochTensor, EventMarker};
pub use error::{PipelineError, Result};
pub use features::{extract_features, FeatureFamily, FeatureMatrix};
pub use filter::{bandpass_filter, filter_table, Bandpass};
pub use ica::{ArtifactMarking, ComponentSummary, IcaDecomposition};
pub use reference::{apply_projections, average_reference_inplace, set_average_reference, Projector};
pub use table::{RawRecord, SignalTable};
pub use truncate::truncate_table;
pub use variability::{band_variability, VariabilityReport};

/// Run the in-memory conditioning chain on a loaded signal table.
///
/// # Steps
///
/// 1. Bandpass every record at its own `size` ([`filter_table`]).
/// 2. Truncate all records to the shortest `size` ([`truncate_table`]).
/// 3. Assemble the `[E, C, T]` epoch tensor ([`assemble_epochs`]).
/// 4. Fit ICA and remove the components in `exclude`.
/// 5. Register and apply the common-average reference.
///
/// # Errors
///
/// Any stage's validation error (cutoffs above Nyquist, empty table,
/// inconsistent signal lengths, `exclude` naming a component that was not
/// fitted) or an internal ICA failure.
pub fn preprocess(table: &SignalTable, exclude: &BTreeSet<usize>, cfg: &PipelineConfig) -> Result<EpochTensor> {
    let filtered = filter_table(table, cfg)?;
    let truncated = truncate_table(&filtered)?;
    let (epochs, _report) = assemble_epochs(&truncated)?;
    let mut decomposition = IcaDecomposition::fit(&epochs, cfg)?;
    decomposition.set_exclude(exclude.clone())?;
    let cleaned = decomposition.apply(&epochs)?;
    Ok(set_average_reference(&cleaned))
}
