//! Truncation of every record to the shortest reported `size`.
//!
//! `target_length = min(size)`; each signal keeps its first `target_length`
//! samples and every `size` is rewritten to `target_length`.
use crate::error::{PipelineError, Result};
use crate::table::SignalTable;

/// Shortest `size` across the table, or a validation error if it is empty.
pub fn target_length(table: &SignalTable) -> Result<usize> {
    table
        .records
        .iter()
        .map(|r| r.size)
        .min()
        .ok_or_else(|| PipelineError::validation("cannot truncate an empty signal table"))
}

/// Truncate a copy of `table`.
///
/// Fails if any signal ends up shorter than `target_length` (its `size`
/// overstated the number of samples actually present).
pub fn truncate_table(table: &SignalTable) -> Result<SignalTable> {
    let target = target_length(table)?;
    let mut out = table.clone();
    for (i, r) in out.records.iter_mut().enumerate() {
        r.signal.truncate(target);
        r.size = target;
        if r.signal.len() != target {
            return Err(PipelineError::validation(format!(
                "record {i} (event {}, channel {}) has {} samples, expected {target}",
                r.event,
                r.channel,
                r.signal.len()
            )));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawRecord;

    fn rec(signal: Vec<f64>, size: usize) -> RawRecord {
        RawRecord { id: 0, event: 0, channel: "O1".into(), code: 0, size, signal }
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(truncate_table(&SignalTable::default()), Err(PipelineError::Validation(_))));
    }

    #[test]
    fn overstated_size_is_rejected() {
        let table = SignalTable::new(vec![rec(vec![1.0, 2.0], 5), rec(vec![1.0; 8], 8)]);
        assert!(matches!(truncate_table(&table), Err(PipelineError::Validation(_))));
    }

    #[test]
    fn input_is_left_untouched() {
        let table = SignalTable::new(vec![rec(vec![1.0, 2.0, 3.0], 3), rec(vec![4.0, 5.0], 2)]);
        let _ = truncate_table(&table).unwrap();
        assert_eq!(table.records[0].signal.len(), 3);
    }
}
