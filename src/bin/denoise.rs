use std::path::PathBuf;

use clap::Parser;
use eegpipe::cli::{run_stage, CommonArgs};
use eegpipe::stages;

#[derive(Parser)]
#[command(name = "denoise", about = "Re-reference epochs to the common average")]
struct Args {
    /// Cleaned epoch tensor input (.safetensors)
    infile: PathBuf,

    /// Re-referenced epoch tensor output (.safetensors)
    outfile: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args = Args::parse();
    args.common.init_logging();
    let ctx = args.common.context("denoise");

    let code = run_stage(ctx.target(), || {
        stages::denoise(&ctx, &args.infile, &args.outfile)?;
        Ok(())
    });
    std::process::exit(code);
}
