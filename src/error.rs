//! Pipeline error taxonomy.
//!
//! Every stage returns [`PipelineError`].  The variants fall into the three
//! externally visible exit tiers:
//!
//! | exit | meaning                                   | variants |
//! |------|-------------------------------------------|----------|
//! | 0    | success                                   | —        |
//! | 1    | recognised input / output / validation    | everything except `Internal` |
//! | 99   | unanticipated internal failure (or panic) | `Internal` |
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SUCCESS: i32 = 0;
pub const INPUT_ERROR: i32 = 1;
pub const INTERNAL_ERROR: i32 = 99;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("output directory does not exist: {}", .0.display())]
    OutputDirMissing(PathBuf),

    #[error("{}:{line}: invalid `{field}`: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        field: &'static str,
        message: String,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("malformed file {}: {message}", .path.display())]
    Format { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Internal(_) => INTERNAL_ERROR,
            _ => INPUT_ERROR,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        PipelineError::Validation(msg.into())
    }

    pub fn format(path: &Path, msg: impl Into<String>) -> Self {
        PipelineError::Format { path: path.to_path_buf(), message: msg.into() }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return PipelineError::FileNotFound(path.to_path_buf());
        }
        PipelineError::Io { path: path.to_path_buf(), source }
    }
}
