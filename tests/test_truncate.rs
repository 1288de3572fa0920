mod common;
use common::record;
use eegpipe::truncate::{target_length, truncate_table};
use eegpipe::{PipelineError, SignalTable};

#[test]
fn every_record_cut_to_shortest_size() {
    let table = SignalTable::new(vec![
        record(1, "AF3", 0, vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        record(1, "F7", 0, vec![6.0, 7.0, 8.0]),
        record(2, "AF3", 1, vec![9.0, 10.0, 11.0, 12.0]),
    ]);
    assert_eq!(target_length(&table).unwrap(), 3);

    let out = truncate_table(&table).unwrap();
    assert_eq!(out.records[0].signal, vec![1.0, 2.0, 3.0]);
    assert_eq!(out.records[1].signal, vec![6.0, 7.0, 8.0]);
    assert_eq!(out.records[2].signal, vec![9.0, 10.0, 11.0]);
    assert!(out.records.iter().all(|r| r.size == 3));
    // input untouched
    assert_eq!(table.records[0].size, 5);
}

#[test]
fn empty_table_is_rejected() {
    let err = truncate_table(&SignalTable::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[test]
fn overstated_size_is_rejected() {
    let mut short = record(1, "O1", 0, vec![1.0, 2.0]);
    short.size = 4;
    let table = SignalTable::new(vec![short, record(1, "O2", 0, vec![1.0; 6])]);
    assert!(matches!(truncate_table(&table).unwrap_err(), PipelineError::Validation(_)));
}
