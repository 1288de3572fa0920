//! Raw device export parsing and unit conversion.
//!
//! Input is a tab-separated text file with seven fields per line:
//!
//! ```text
//! id \t event \t device \t channel \t code \t size \t s0,s1,s2,...
//! ```
//!
//! The `device` column is dropped.  Samples are raw ADC counts; they are
//! multiplied by the device LSB (`conversion_factor`) to obtain microvolts.
use std::io::BufRead;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::table::{RawRecord, SignalTable};

/// Number of tab-separated fields on every line.
pub const N_FIELDS: usize = 7;

/// Parse one line (1-based `line_no` for error reporting).
pub fn parse_line(line: &str, line_no: usize, path: &Path) -> Result<RawRecord> {
    let err = |field: &'static str, message: String| PipelineError::Parse {
        path: path.to_path_buf(),
        line: line_no,
        field,
        message,
    };
    let parts: Vec<&str> = line.trim().split('\t').collect();
    if parts.len() != N_FIELDS {
        return Err(err(
            "line",
            format!("expected {N_FIELDS} tab-separated fields, found {}", parts.len()),
        ));
    }

    let int = |field: &'static str, s: &str| -> Result<i64> {
        s.trim().parse::<i64>().map_err(|e| err(field, format!("{s:?}: {e}")))
    };
    let size = int("size", parts[5])?;
    if size < 0 {
        return Err(err("size", format!("negative sample count {size}")));
    }
    let signal = parts[6]
        .split(',')
        .map(|s| s.trim().parse::<f64>().map_err(|e| err("signal", format!("{s:?}: {e}"))))
        .collect::<Result<Vec<f64>>>()?;

    Ok(RawRecord {
        id: int("id", parts[0])?,
        event: int("event", parts[1])?,
        channel: parts[3].trim().to_string(),
        code: int("code", parts[4])?,
        size: size as usize,
        signal,
    })
}

/// Parse a whole export.  `limit` keeps only the first N rows (mock mode).
///
/// Every line up to the limit must parse; nothing is skipped silently.
pub fn read_records<R: BufRead>(reader: R, path: &Path, limit: Option<usize>) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        if limit.is_some_and(|n| records.len() >= n) {
            break;
        }
        let line = line.map_err(|e| PipelineError::io(path, e))?;
        records.push(parse_line(&line, idx + 1, path)?);
    }
    Ok(records)
}

/// Multiply every sample by `factor` (counts → µV).
pub fn convert_units(table: &mut SignalTable, factor: f64) {
    for r in &mut table.records {
        r.signal.iter_mut().for_each(|v| *v *= factor);
    }
}

/// Read `path`, parse it and convert to microvolts.
pub fn load_export(path: &Path, conversion_factor: f64, limit: Option<usize>) -> Result<SignalTable> {
    let file = std::fs::File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let records = read_records(std::io::BufReader::new(file), path, limit)?;
    let mut table = SignalTable::new(records);
    convert_units(&mut table, conversion_factor);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "67635\t67635\tEP\tAF3\t6\t260\t4395.384615,4382.564102,4377.435897";

    #[test]
    fn parses_all_fields_and_drops_device() {
        let r = parse_line(LINE, 1, Path::new("x.txt")).unwrap();
        assert_eq!(r.id, 67635);
        assert_eq!(r.event, 67635);
        assert_eq!(r.channel, "AF3");
        assert_eq!(r.code, 6);
        assert_eq!(r.size, 260);
        assert_eq!(r.signal.len(), 3);
        approx::assert_abs_diff_eq!(r.signal[0], 4395.384615, epsilon = 1e-9);
    }

    #[test]
    fn short_line_is_a_parse_error() {
        let err = parse_line("1\t2\tEP\tAF3\t6", 4, Path::new("x.txt")).unwrap_err();
        match err {
            PipelineError::Parse { line, field, .. } => {
                assert_eq!(line, 4);
                assert_eq!(field, "line");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn extra_field_is_a_parse_error() {
        let line = format!("{LINE}\textra");
        let err = parse_line(&line, 9, Path::new("x.txt")).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { line: 9, field: "line", .. }));
    }

    #[test]
    fn non_numeric_sample_names_signal_field() {
        let line = "1\t2\tEP\tAF3\t6\t3\t1.0,abc,3.0";
        let err = parse_line(line, 1, Path::new("x.txt")).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { field: "signal", .. }));
    }

    #[test]
    fn mock_limit_keeps_leading_rows() {
        let text = format!("{LINE}\n{LINE}\n{LINE}\n");
        let recs = read_records(text.as_bytes(), Path::new("x.txt"), Some(2)).unwrap();
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn malformed_row_after_good_rows_fails_whole_read() {
        let text = format!("{LINE}\nbroken\n{LINE}\n");
        let err = read_records(text.as_bytes(), Path::new("x.txt"), None).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { line: 2, .. }));
    }

    #[test]
    fn conversion_scales_every_sample() {
        let mut table = SignalTable::new(vec![parse_line(LINE, 1, Path::new("x")).unwrap()]);
        convert_units(&mut table, 0.125);
        approx::assert_abs_diff_eq!(table.records[0].signal[1], 4382.564102 * 0.125, epsilon = 1e-9);
    }
}
