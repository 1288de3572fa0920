/// pipeline: run every stage from a raw export to features and the band
/// variability report, keeping each intermediate artifact.
///
/// Files written to OUT_DIR:
///   signal_table.safetensors    parsed records in µV
///   filtered.safetensors        after the bandpass
///   truncated.safetensors       after truncation
///   cleaned-epo.safetensors     epochs after ICA artifact removal
///   denoised-epo.safetensors    epochs after average reference
///   features.safetensors        feature matrix
///   variability.json            band variability report
use std::path::PathBuf;

use clap::Parser;
use eegpipe::cli::{run_stage, CommonArgs};
use eegpipe::stages::{run_pipeline, PipelineRun};
use eegpipe::{ArtifactMarking, FeatureFamily};
use log::info;

#[derive(Parser)]
#[command(name = "pipeline", about = "Run the whole EEG pipeline from a raw export")]
struct Args {
    /// Raw tab-separated export
    infile: PathBuf,

    /// Existing directory that receives every artifact
    out_dir: PathBuf,

    /// Keep only the first `mock_rows` rows of the export
    #[arg(long)]
    mock: bool,

    /// File with comma-separated artifact component indices
    #[arg(short, long, conflicts_with = "inspect")]
    artifacts: Option<PathBuf>,

    /// Review every ICA component interactively
    #[arg(short, long)]
    inspect: bool,

    /// Feature families to compute
    #[arg(short, long, value_enum, num_args = 1.., default_values_t = FeatureFamily::ALL)]
    features: Vec<FeatureFamily>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args = Args::parse();
    args.common.init_logging();
    let ctx = args.common.context("pipeline");

    let code = run_stage(ctx.target(), || {
        let cfg = args.common.pipeline_config(&ctx)?;
        let run = PipelineRun {
            raw: args.infile.clone(),
            out_dir: args.out_dir.clone(),
            mock: args.mock,
            marking: ArtifactMarking::from_flags(args.inspect, args.artifacts.clone())?,
            families: args.features.clone(),
        };
        let (features, report) = run_pipeline(&ctx, &run, &cfg)?;
        info!(
            target: ctx.target(),
            "{} features over {} epochs; max variability in {}",
            features.len(),
            features.n_epochs,
            report.max_var_band
        );
        Ok(())
    });
    std::process::exit(code);
}
