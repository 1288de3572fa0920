mod common;
use assert_cmd::Command;
use common::write_export;
use predicates::prelude::*;

#[test]
fn load_data_writes_signal_table() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), "raw.txt", 3, 128);
    Command::cargo_bin("load_data")
        .unwrap()
        .args(["raw.txt", "table.safetensors", "--root"])
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("loaded 12 records"));
    assert!(dir.path().join("table.safetensors").is_file());
}

#[test]
fn missing_input_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("truncate_signal")
        .unwrap()
        .args(["absent.safetensors", "out.safetensors", "--root"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("absent.safetensors"));
}

#[test]
fn missing_output_directory_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), "raw.txt", 1, 128);
    Command::cargo_bin("load_data")
        .unwrap()
        .args(["raw.txt", "no/such/dir/table.safetensors", "--root"])
        .arg(dir.path())
        .assert()
        .code(1);
}

#[test]
fn malformed_export_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("raw.txt"), "not\ta\trecord\n").unwrap();
    Command::cargo_bin("load_data")
        .unwrap()
        .args(["raw.txt", "table.safetensors", "--root"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("raw.txt:1:"));
}

#[test]
fn inspect_and_artifact_file_conflict() {
    Command::cargo_bin("ica")
        .unwrap()
        .args(["in.safetensors", "out.safetensors", "--inspect", "--artifacts", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn unknown_feature_family_is_rejected() {
    Command::cargo_bin("extract_features")
        .unwrap()
        .args(["in.safetensors", "out.safetensors", "--features", "fractal"])
        .assert()
        .failure();
}

#[test]
fn pipeline_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), "raw.txt", 4, 256);
    std::fs::create_dir(dir.path().join("out")).unwrap();
    Command::cargo_bin("pipeline")
        .unwrap()
        .args(["raw.txt", "out", "--features", "statistical", "psd", "--root"])
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("max variability in"));
    assert!(dir.path().join("out/variability.json").is_file());
    assert!(dir.path().join("artifacts.txt").is_file());
}
