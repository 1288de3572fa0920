use std::path::PathBuf;

use clap::Parser;
use eegpipe::cli::{run_stage, CommonArgs};
use eegpipe::{stages, FeatureFamily};

#[derive(Parser)]
#[command(name = "extract_features", about = "Per-channel, per-epoch features from denoised epochs")]
struct Args {
    /// Denoised epoch tensor input (.safetensors)
    infile: PathBuf,

    /// Feature matrix output (.safetensors)
    outfile: PathBuf,

    /// Feature families to compute
    #[arg(
        short,
        long,
        value_enum,
        num_args = 1..,
        default_values_t = FeatureFamily::ALL
    )]
    features: Vec<FeatureFamily>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args = Args::parse();
    args.common.init_logging();
    let ctx = args.common.context("extract_features");

    let code = run_stage(ctx.target(), || {
        let cfg = args.common.pipeline_config(&ctx)?;
        stages::extract_features(&ctx, &args.infile, &args.outfile, &args.features, &cfg)?;
        Ok(())
    });
    std::process::exit(code);
}
