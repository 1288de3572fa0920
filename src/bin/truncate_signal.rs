use std::path::PathBuf;

use clap::Parser;
use eegpipe::cli::{run_stage, CommonArgs};
use eegpipe::stages;

#[derive(Parser)]
#[command(name = "truncate_signal", about = "Trim every signal to the shortest recorded size")]
struct Args {
    /// Signal table input (.safetensors)
    infile: PathBuf,

    /// Truncated signal table output (.safetensors)
    outfile: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args = Args::parse();
    args.common.init_logging();
    let ctx = args.common.context("truncate_signal");

    let code = run_stage(ctx.target(), || {
        stages::truncate_signal(&ctx, &args.infile, &args.outfile)?;
        Ok(())
    });
    std::process::exit(code);
}
