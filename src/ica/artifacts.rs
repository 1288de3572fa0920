//! Selecting which ICA components are artifacts.
//!
//! Three mutually exclusive modes, chosen once when the stage starts:
//!
//! | mode            | source of the exclusion set                             |
//! |-----------------|---------------------------------------------------------|
//! | `Interactive`   | a `y/n` prompt per component on the terminal            |
//! | `FromFile(p)`   | comma-separated component indices in `p`                |
//! | `None`          | empty; an empty placeholder file is created (not truncated) |
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::ica::decompose::ComponentSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactMarking {
    Interactive,
    FromFile(PathBuf),
    None,
}

impl ArtifactMarking {
    /// Build the marking mode from the two CLI flags.
    pub fn from_flags(inspect: bool, artifacts: Option<PathBuf>) -> Result<Self> {
        match (inspect, artifacts) {
            (true, Some(_)) => Err(PipelineError::validation(
                "interactive inspection and an artifact file are mutually exclusive",
            )),
            (true, None) => Ok(ArtifactMarking::Interactive),
            (false, Some(p)) => Ok(ArtifactMarking::FromFile(p)),
            (false, None) => Ok(ArtifactMarking::None),
        }
    }
}

/// Parse `"1,2,3"` into `{1, 2, 3}`.
///
/// Whitespace around tokens (including a trailing newline) is ignored and a
/// blank file is an empty set.  Any other token that is not a non-negative
/// integer is a parse error naming its line.
pub fn parse_artifact_list(text: &str, path: &Path) -> Result<BTreeSet<usize>> {
    if text.trim().is_empty() {
        return Ok(BTreeSet::new());
    }
    let mut out = BTreeSet::new();
    let mut line = 1;
    for token in text.split(',') {
        let leading = &token[..token.len() - token.trim_start().len()];
        let token_line = line + leading.matches('\n').count();
        let value = token.trim();
        out.insert(value.parse::<usize>().map_err(|e| PipelineError::Parse {
            path: path.to_path_buf(),
            line: token_line,
            field: "artifact",
            message: format!("{value:?}: {e}"),
        })?);
        line += token.matches('\n').count();
    }
    Ok(out)
}

/// Read and parse an artifact file.
pub fn read_artifact_file(path: &Path) -> Result<BTreeSet<usize>> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    parse_artifact_list(&text, path)
}

/// Ask about every component on `output`, reading answers from `input`.
///
/// `y` or `Y` marks the component; anything else leaves it.  End of input
/// ends the review with the remaining components unmarked.
pub fn review_components<R: BufRead, W: Write>(
    summaries: &[ComponentSummary],
    mut input: R,
    mut output: W,
) -> Result<BTreeSet<usize>> {
    let io_err = |e| PipelineError::io(Path::new("<terminal>"), e);
    let mut marked = BTreeSet::new();
    for s in summaries {
        writeln!(output, "{s}").map_err(io_err)?;
        write!(output, "Mark component {} as an artifact? (y/n): ", s.index).map_err(io_err)?;
        output.flush().map_err(io_err)?;
        let mut answer = String::new();
        if input.read_line(&mut answer).map_err(io_err)? == 0 {
            break;
        }
        if answer.trim().eq_ignore_ascii_case("y") {
            marked.insert(s.index);
        }
    }
    Ok(marked)
}

/// Create `path` if it does not exist; never truncates an existing file.
pub fn touch_placeholder(path: &Path) -> Result<()> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| PipelineError::io(path, e))
}
