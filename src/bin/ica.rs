use std::path::PathBuf;

use clap::Parser;
use eegpipe::cli::{run_stage, CommonArgs};
use eegpipe::{stages, ArtifactMarking};

#[derive(Parser)]
#[command(name = "ica", about = "Epoch the truncated table and remove ICA artifact components")]
struct Args {
    /// Truncated signal table input (.safetensors)
    infile: PathBuf,

    /// Cleaned epoch tensor output (.safetensors)
    outfile: PathBuf,

    /// File with comma-separated artifact component indices
    #[arg(short, long, conflicts_with = "inspect")]
    artifacts: Option<PathBuf>,

    /// Review every component interactively and answer y/n
    #[arg(short, long)]
    inspect: bool,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args = Args::parse();
    args.common.init_logging();
    let ctx = args.common.context("ica");

    let code = run_stage(ctx.target(), || {
        let cfg = args.common.pipeline_config(&ctx)?;
        let marking = ArtifactMarking::from_flags(args.inspect, args.artifacts.clone())?;
        stages::ica(&ctx, &args.infile, &args.outfile, &cfg, marking)?;
        Ok(())
    });
    std::process::exit(code);
}
