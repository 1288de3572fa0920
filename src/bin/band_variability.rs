use std::path::PathBuf;

use clap::Parser;
use eegpipe::cli::{run_stage, CommonArgs};
use eegpipe::stages;

#[derive(Parser)]
#[command(name = "band_variability", about = "Which frequency band varies most across channels")]
struct Args {
    /// Denoised epoch tensor input (.safetensors)
    infile: PathBuf,

    /// JSON report output
    outfile: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args = Args::parse();
    args.common.init_logging();
    let ctx = args.common.context("band_variability");

    let code = run_stage(ctx.target(), || {
        let cfg = args.common.pipeline_config(&ctx)?;
        stages::band_variability(&ctx, &args.infile, &args.outfile, &cfg)?;
        Ok(())
    });
    std::process::exit(code);
}
