use std::path::PathBuf;

use clap::Parser;
use eegpipe::cli::{run_stage, CommonArgs};
use eegpipe::stages;

#[derive(Parser)]
#[command(name = "bandpass_filter", about = "Zero-phase Butterworth bandpass of every signal record")]
struct Args {
    /// Signal table input (.safetensors)
    infile: PathBuf,

    /// Filtered signal table output (.safetensors)
    outfile: PathBuf,

    /// Lower passband edge in Hz (overrides the config)
    #[arg(long)]
    lowcut: Option<f64>,

    /// Upper passband edge in Hz (overrides the config)
    #[arg(long)]
    highcut: Option<f64>,

    /// Butterworth order (overrides the config)
    #[arg(long)]
    order: Option<usize>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args = Args::parse();
    args.common.init_logging();
    let ctx = args.common.context("bandpass_filter");

    let code = run_stage(ctx.target(), || {
        let mut cfg = args.common.pipeline_config(&ctx)?;
        cfg.lowcut = args.lowcut.unwrap_or(cfg.lowcut);
        cfg.highcut = args.highcut.unwrap_or(cfg.highcut);
        cfg.filter_order = args.order.unwrap_or(cfg.filter_order);
        stages::bandpass_filter(&ctx, &args.infile, &args.outfile, &cfg)?;
        Ok(())
    });
    std::process::exit(code);
}
