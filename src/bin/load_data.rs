use std::path::PathBuf;

use clap::Parser;
use eegpipe::cli::{run_stage, CommonArgs};
use eegpipe::stages;

#[derive(Parser)]
#[command(name = "load_data", about = "Parse a raw EEG export and convert device counts to microvolts")]
struct Args {
    /// Raw tab-separated export (id, event, device, channel, code, size, signal)
    infile: PathBuf,

    /// Signal table output (.safetensors)
    outfile: PathBuf,

    /// Keep only the first `mock_rows` rows (default 10 000)
    #[arg(long)]
    mock: bool,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args = Args::parse();
    args.common.init_logging();
    let ctx = args.common.context("load_data");

    let code = run_stage(ctx.target(), || {
        let cfg = args.common.pipeline_config(&ctx)?;
        stages::load_data(&ctx, &args.infile, &args.outfile, &cfg, args.mock)?;
        Ok(())
    });
    std::process::exit(code);
}
