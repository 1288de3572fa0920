//! ICA artifact removal.
//!
//! - [`decompose`]: seeded FastICA fit, component summaries, back-projection
//!   without the excluded components.
//! - [`artifacts`]: interactive, file-driven or empty artifact marking.

pub mod artifacts;
pub mod decompose;

pub use artifacts::{parse_artifact_list, read_artifact_file, review_components, touch_placeholder, ArtifactMarking};
pub use decompose::{ComponentSummary, IcaDecomposition};
