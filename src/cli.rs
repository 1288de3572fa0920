//! Shared plumbing for the stage binaries.
//!
//! Every binary flattens [`CommonArgs`] into its own clap parser, then hands
//! its work to [`run_stage`], which turns the outcome into the process exit
//! code:
//!
//! | outcome                             | exit |
//! |-------------------------------------|------|
//! | success                             | 0    |
//! | recognised input/validation error   | 1    |
//! | internal error or panic             | 99   |
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use clap::{ArgAction, Args};
use log::{debug, error, LevelFilter};

use crate::config::PipelineConfig;
use crate::context::Context;
use crate::error::{Result, INTERNAL_ERROR, SUCCESS};

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Directory that relative input/output paths are resolved against.
    #[arg(long, env = "EEGPIPE_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// JSON file overriding pipeline settings (missing keys keep defaults).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).  `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CommonArgs {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Install the global logger.  Safe to call more than once.
    pub fn init_logging(&self) {
        let _ = env_logger::Builder::new()
            .filter_level(self.log_level())
            .parse_default_env()
            .format_timestamp(None)
            .try_init();
    }

    pub fn context(&self, stage: &'static str) -> Context {
        Context::new(stage, self.root.clone())
    }

    /// Defaults, overridden by `--config` when given.
    pub fn pipeline_config(&self, ctx: &Context) -> Result<PipelineConfig> {
        match &self.config {
            Some(path) => {
                let path = ctx.input(path)?;
                debug!(target: ctx.target(), "configuration from {}", path.display());
                PipelineConfig::from_json_file(&path)
            }
            None => Ok(PipelineConfig::default()),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one stage and map its outcome to an exit code, logging failures under
/// the stage's target.
pub fn run_stage<F>(stage: &'static str, f: F) -> i32
where
    F: FnOnce() -> Result<()>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => SUCCESS,
        Ok(Err(e)) => {
            error!(target: stage, "{e}");
            debug!(target: stage, "{e:?}");
            e.exit_code()
        }
        Err(payload) => {
            error!(target: stage, "unexpected internal error: {}", panic_message(payload.as_ref()));
            INTERNAL_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, INPUT_ERROR};

    #[test]
    fn exit_codes_follow_outcome() {
        assert_eq!(run_stage("t", || Ok(())), SUCCESS);
        assert_eq!(run_stage("t", || Err(PipelineError::validation("bad"))), INPUT_ERROR);
        assert_eq!(run_stage("t", || Err(anyhow::anyhow!("solver").into())), INTERNAL_ERROR);
    }

    #[test]
    fn panic_maps_to_internal_error() {
        assert_eq!(run_stage("t", || panic!("index out of bounds")), INTERNAL_ERROR);
    }

    #[test]
    fn verbosity_raises_level() {
        let mut args = CommonArgs { root: ".".into(), config: None, verbose: 0 };
        assert_eq!(args.log_level(), LevelFilter::Info);
        args.verbose = 3;
        assert_eq!(args.log_level(), LevelFilter::Trace);
    }
}
