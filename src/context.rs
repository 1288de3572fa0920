//! Execution context passed explicitly to every stage.
//!
//! Holds the path-resolution root (relative file names are resolved against
//! it) and the stage name used as the `log` target, so nothing in the library
//! depends on the process working directory or a module-level logger.
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct Context {
    root: PathBuf,
    stage: &'static str,
}

impl Context {
    pub fn new(stage: &'static str, root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), stage }
    }

    /// Same root, different stage name (used by the end-to-end runner).
    pub fn for_stage(&self, stage: &'static str) -> Self {
        Self { root: self.root.clone(), stage }
    }

    /// Log target for this stage.
    pub fn target(&self) -> &'static str {
        self.stage
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute paths are returned unchanged; relative ones are joined to the
    /// context root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Resolve an input path and check that it exists.
    pub fn input(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let resolved = self.resolve(path);
        if !resolved.is_file() {
            return Err(PipelineError::FileNotFound(resolved));
        }
        Ok(resolved)
    }

    /// Resolve an output path and check that its directory exists.
    ///
    /// Stages call this before any heavy computation.
    pub fn output(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let resolved = self.resolve(path);
        let dir = match resolved.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.is_dir() {
            return Err(PipelineError::OutputDirMissing(dir));
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_root() {
        let ctx = Context::new("test", "/data/run1");
        assert_eq!(ctx.resolve("raw.txt"), PathBuf::from("/data/run1/raw.txt"));
        assert_eq!(ctx.resolve("/abs/raw.txt"), PathBuf::from("/abs/raw.txt"));
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new("test", dir.path());
        let err = ctx.input("nope.txt").unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn missing_output_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new("test", dir.path());
        assert!(ctx.output("out.st").is_ok());
        let err = ctx.output("no/such/dir/out.st").unwrap_err();
        assert!(matches!(err, PipelineError::OutputDirMissing(_)));
    }
}
