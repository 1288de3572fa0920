//! The pipeline stages: read one artifact, write the next.
//!
//! ```text
//! raw export (.txt)
//!   │
//!   ├─ load_data          parse, counts → µV                 → signal table
//!   ├─ bandpass_filter    Butterworth sosfiltfilt per record → signal table
//!   ├─ truncate_signal    every record to min(size)          → signal table
//!   ├─ ica                epochs + FastICA artifact removal  → epoch tensor
//!   ├─ denoise            average reference projection       → epoch tensor
//!   ├─ extract_features   statistical/wavelet/psd/entropy    → feature matrix
//!   └─ band_variability   band PSD spread across channels    → JSON report
//! ```
//!
//! Every stage resolves and checks its input and output paths before doing
//! any work, logs through the context's target, and writes its artifact
//! atomically.
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::context::Context;
use crate::epoch::{assemble_epochs, EpochTensor};
use crate::error::{PipelineError, Result};
use crate::features::{extract_features as extract, FeatureFamily, FeatureMatrix};
use crate::filter::filter_table;
use crate::ica::{read_artifact_file, review_components, touch_placeholder, ArtifactMarking, IcaDecomposition};
use crate::ingest::load_export;
use crate::reference::set_average_reference;
use crate::table::SignalTable;
use crate::truncate::truncate_table;
use crate::variability::{band_variability as variability, VariabilityReport};

/// Parse a raw export and write it as a signal table in microvolts.
///
/// `mock` keeps only the first `cfg.mock_rows` rows.
pub fn load_data(ctx: &Context, infile: &Path, outfile: &Path, cfg: &PipelineConfig, mock: bool) -> Result<SignalTable> {
    let input = ctx.input(infile)?;
    let output = ctx.output(outfile)?;
    let limit = mock.then_some(cfg.mock_rows);
    if let Some(n) = limit {
        info!(target: ctx.target(), "mock mode: keeping the first {n} rows");
    }
    let table = load_export(&input, cfg.conversion_factor, limit)?;
    info!(
        target: ctx.target(),
        "loaded {} records ({} channels, {} events) from {}",
        table.len(),
        table.channels().len(),
        table.events().len(),
        input.display()
    );
    table.save(&output)?;
    info!(target: ctx.target(), "signal table saved to {}", output.display());
    Ok(table)
}

/// Zero-phase bandpass every record at its own `size` as sampling rate.
pub fn bandpass_filter(ctx: &Context, infile: &Path, outfile: &Path, cfg: &PipelineConfig) -> Result<SignalTable> {
    let input = ctx.input(infile)?;
    let output = ctx.output(outfile)?;
    let table = SignalTable::load(&input)?;
    info!(
        target: ctx.target(),
        "filtering {} records: {}–{} Hz, order {}",
        table.len(),
        cfg.lowcut,
        cfg.highcut,
        cfg.filter_order
    );
    let filtered = filter_table(&table, cfg)?;
    filtered.save(&output)?;
    info!(target: ctx.target(), "filtered table saved to {}", output.display());
    Ok(filtered)
}

/// Trim every record to the shortest `size`.
pub fn truncate_signal(ctx: &Context, infile: &Path, outfile: &Path) -> Result<SignalTable> {
    let input = ctx.input(infile)?;
    let output = ctx.output(outfile)?;
    let table = SignalTable::load(&input)?;
    let truncated = truncate_table(&table)?;
    if let Some(first) = truncated.records.first() {
        info!(target: ctx.target(), "size adjusted to {}", first.size);
    }
    truncated.save(&output)?;
    info!(target: ctx.target(), "truncated table saved to {}", output.display());
    Ok(truncated)
}

/// Resolve the artifact file path (if any) against the context so a missing
/// file fails before the fit.
fn resolve_marking(ctx: &Context, marking: ArtifactMarking) -> Result<ArtifactMarking> {
    match marking {
        ArtifactMarking::FromFile(p) => Ok(ArtifactMarking::FromFile(ctx.input(p)?)),
        other => Ok(other),
    }
}

/// Epoch the table, fit ICA, remove the marked components.
///
/// Interactive marking reads answers from stdin and prompts on stdout.
pub fn ica(
    ctx: &Context,
    infile: &Path,
    outfile: &Path,
    cfg: &PipelineConfig,
    marking: ArtifactMarking,
) -> Result<EpochTensor> {
    let stdin = std::io::stdin();
    ica_with_terminal(ctx, infile, outfile, cfg, marking, stdin.lock(), std::io::stdout())
}

/// [`ica`] with explicit prompt input and output.
pub fn ica_with_terminal<R: BufRead, W: Write>(
    ctx: &Context,
    infile: &Path,
    outfile: &Path,
    cfg: &PipelineConfig,
    marking: ArtifactMarking,
    input: R,
    output: W,
) -> Result<EpochTensor> {
    let in_path = ctx.input(infile)?;
    let out_path = ctx.output(outfile)?;
    let marking = resolve_marking(ctx, marking)?;
    let preset = match &marking {
        ArtifactMarking::FromFile(p) => Some(read_artifact_file(p)?),
        _ => None,
    };

    let table = SignalTable::load(&in_path)?;
    info!(target: ctx.target(), "truncated data loaded ({} records)", table.len());

    let (tensor, report) = assemble_epochs(&table)?;
    info!(
        target: ctx.target(),
        "processing data for {} events: epochs shape [{}, {}, {}] at {} Hz",
        tensor.n_epochs(),
        tensor.n_epochs(),
        tensor.n_channels(),
        tensor.n_times(),
        tensor.sfreq
    );
    for (event, ch) in &report.padded {
        warn!(target: ctx.target(), "event {event}: channel {ch} missing, zero-padded");
    }
    for (event, ch) in &report.duplicates {
        warn!(target: ctx.target(), "event {event}: duplicate record for channel {ch} ignored");
    }
    if !report.unplaced.is_empty() {
        warn!(target: ctx.target(), "no 10-20 position for channels {:?}", report.unplaced);
    }

    let mut decomposition = IcaDecomposition::fit(&tensor, cfg)?;
    let summaries = decomposition.summaries(&tensor);
    info!(target: ctx.target(), "fitted {} ICA components", decomposition.n_components());
    for s in &summaries {
        debug!(target: ctx.target(), "{s}");
    }

    let exclude = match marking {
        ArtifactMarking::Interactive => review_components(&summaries, input, output)?,
        ArtifactMarking::FromFile(_) => preset.unwrap_or_default(),
        ArtifactMarking::None => {
            let placeholder = ctx.resolve(&cfg.artifact_placeholder);
            touch_placeholder(&placeholder)?;
            debug!(target: ctx.target(), "artifact placeholder at {}", placeholder.display());
            Default::default()
        }
    };
    info!(target: ctx.target(), "identified artifact components: {:?}", exclude);
    decomposition.set_exclude(exclude)?;

    let cleaned = decomposition.apply(&tensor)?;
    cleaned.save(&out_path)?;
    info!(target: ctx.target(), "cleaned data saved to {}", out_path.display());
    Ok(cleaned)
}

/// Register and apply the common-average reference projection.
pub fn denoise(ctx: &Context, infile: &Path, outfile: &Path) -> Result<EpochTensor> {
    let input = ctx.input(infile)?;
    let output = ctx.output(outfile)?;
    info!(target: ctx.target(), "reading data from {}", input.display());
    let tensor = EpochTensor::load(&input)?;
    let referenced = set_average_reference(&tensor);
    referenced.save(&output)?;
    info!(target: ctx.target(), "denoised data saved to {}", output.display());
    Ok(referenced)
}

/// Compute the selected feature families for every channel and epoch.
pub fn extract_features(
    ctx: &Context,
    infile: &Path,
    outfile: &Path,
    families: &[FeatureFamily],
    cfg: &PipelineConfig,
) -> Result<FeatureMatrix> {
    let input = ctx.input(infile)?;
    let output = ctx.output(outfile)?;
    let tensor = EpochTensor::load(&input)?;
    info!(
        target: ctx.target(),
        "denoised data loaded; extracting {:?} for {} channels × {} epochs",
        families.iter().map(FeatureFamily::as_str).collect::<Vec<_>>(),
        tensor.n_channels(),
        tensor.n_epochs()
    );
    let features = extract(&tensor, families, cfg)?;
    features.save(&output)?;
    info!(target: ctx.target(), "{} features saved to {}", features.len(), output.display());
    Ok(features)
}

/// Band-power variability across channels, as a JSON report.
pub fn band_variability(ctx: &Context, infile: &Path, outfile: &Path, cfg: &PipelineConfig) -> Result<VariabilityReport> {
    let input = ctx.input(infile)?;
    let output = ctx.output(outfile)?;
    let tensor = EpochTensor::load(&input)?;
    info!(
        target: ctx.target(),
        "calculating band PSD for {} events",
        tensor.n_epochs().min(cfg.variability_max_epochs)
    );
    let report = variability(&tensor, cfg)?;
    report.save(&output)?;
    info!(
        target: ctx.target(),
        "max variability in {} band; report saved to {}",
        report.max_var_band,
        output.display()
    );
    Ok(report)
}

// ── End to end ───────────────────────────────────────────────────────────────

/// Artifact file names written by [`run_pipeline`] inside the output
/// directory.
pub mod artifacts {
    pub const SIGNAL_TABLE: &str = "signal_table.safetensors";
    pub const FILTERED: &str = "filtered.safetensors";
    pub const TRUNCATED: &str = "truncated.safetensors";
    pub const CLEANED: &str = "cleaned-epo.safetensors";
    pub const DENOISED: &str = "denoised-epo.safetensors";
    pub const FEATURES: &str = "features.safetensors";
    pub const VARIABILITY: &str = "variability.json";
}

/// Options for [`run_pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub raw: PathBuf,
    pub out_dir: PathBuf,
    pub mock: bool,
    pub marking: ArtifactMarking,
    pub families: Vec<FeatureFamily>,
}

/// Run every stage in order, keeping each intermediate artifact in
/// `out_dir`.  Returns the feature matrix and the variability report.
pub fn run_pipeline(ctx: &Context, run: &PipelineRun, cfg: &PipelineConfig) -> Result<(FeatureMatrix, VariabilityReport)> {
    let dir = ctx.resolve(&run.out_dir);
    if !dir.is_dir() {
        return Err(PipelineError::OutputDirMissing(dir));
    }
    let at = |name: &str| dir.join(name);
    let raw = ctx.input(&run.raw)?;

    load_data(&ctx.for_stage("load_data"), &raw, &at(artifacts::SIGNAL_TABLE), cfg, run.mock)?;
    bandpass_filter(&ctx.for_stage("bandpass_filter"), &at(artifacts::SIGNAL_TABLE), &at(artifacts::FILTERED), cfg)?;
    truncate_signal(&ctx.for_stage("truncate_signal"), &at(artifacts::FILTERED), &at(artifacts::TRUNCATED))?;
    ica(&ctx.for_stage("ica"), &at(artifacts::TRUNCATED), &at(artifacts::CLEANED), cfg, run.marking.clone())?;
    denoise(&ctx.for_stage("denoise"), &at(artifacts::CLEANED), &at(artifacts::DENOISED))?;
    let features = extract_features(
        &ctx.for_stage("extract_features"),
        &at(artifacts::DENOISED),
        &at(artifacts::FEATURES),
        &run.families,
        cfg,
    )?;
    let report = band_variability(&ctx.for_stage("band_variability"), &at(artifacts::DENOISED), &at(artifacts::VARIABILITY), cfg)?;
    info!(target: ctx.target(), "pipeline finished; artifacts in {}", dir.display());
    Ok((features, report))
}
