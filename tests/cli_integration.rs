//! Command-line round trip: synth, run, train and report

use clap::Parser;
use gemelo::cli::{run_command, Cli};
use gemelo::sync::SyncMetrics;
use gemelo::train::read_checkpoint;
use std::path::Path;
use tempfile::TempDir;

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("gemelo").chain(args.iter().copied())).expect("arguments should parse")
}

fn path(p: &Path) -> &str {
    p.to_str().expect("temp paths are UTF-8")
}

fn synth(root: &Path) {
    run_command(cli(&[
        "-q",
        "synth",
        "-o",
        path(root),
        "-t",
        "germany",
        "--suffixes",
        "0,1",
        "--testing-windows",
        "20",
    ]))
    .expect("synth should succeed");
}

#[test]
fn test_synth_then_dry_run() {
    let tmp = TempDir::new().expect("temp file creation should succeed");
    let data = tmp.path().join("data");
    synth(&data);
    assert!(data.join("germany/experiment_200_cv/testing.jsonl.gz").is_file());
    assert!(data.join("germany/experiment_201_cv/training.jsonl.gz").is_file());

    let weights = tmp.path().join("weights");
    run_command(cli(&[
        "-q",
        "run",
        "-t",
        "germany",
        "-d",
        path(&data),
        "--suffixes",
        "0,1",
        "--checkpoint-dir",
        path(&weights),
        "--dry-run",
    ]))
    .expect("dry run should succeed");
    assert!(!weights.exists());
}

#[test]
fn test_run_and_report() {
    let tmp = TempDir::new().expect("temp file creation should succeed");
    let data = tmp.path().join("data");
    let results = tmp.path().join("results");
    synth(&data);

    run_command(cli(&[
        "-q",
        "run",
        "-t",
        "germany",
        "-d",
        path(&data),
        "--suffixes",
        "0,1",
        "--checkpoint-dir",
        path(&tmp.path().join("weights")),
        "--results-dir",
        path(&results),
        "-e",
        "2",
        "--no-pacing",
        "--launcher",
        "thread",
    ]))
    .expect("run should succeed");

    let file = results.join("germany/results_delay_sync_false_r_0.json");
    let metrics = SyncMetrics::load(&file).expect("results should load");
    assert_eq!(metrics.windows(), 40);
    assert!(metrics.model_updated.is_empty());

    run_command(cli(&["-q", "report", path(&file), "--change-points", "20", "-f", "json"]))
        .expect("report should succeed");
}

#[test]
fn test_train_writes_checkpoint() {
    let tmp = TempDir::new().expect("temp file creation should succeed");
    let data = tmp.path().join("data");
    synth(&data);

    let weights = tmp.path().join("w/model_version_1/delay_final_weight");
    let log = tmp.path().join("durations.json");
    run_command(cli(&[
        "-q",
        "train",
        "--dataset",
        path(&data.join("germany/experiment_201_cv")),
        "--checkpoint",
        path(&weights),
        "--duration-log",
        path(&log),
        "--epochs",
        "2",
    ]))
    .expect("train should succeed");

    assert!(read_checkpoint(&weights).is_ok());
    let durations: Vec<f64> =
        serde_json::from_slice(&std::fs::read(&log).expect("log should exist")).expect("log should parse");
    assert_eq!(durations.len(), 1);
}

#[test]
fn test_run_without_topology_fails_with_config_error() {
    let tmp = TempDir::new().expect("temp file creation should succeed");
    let err = run_command(cli(&["-q", "run", "-d", path(tmp.path())])).unwrap_err();
    assert!(err.starts_with("Config error"), "unexpected message: {err}");
}

#[test]
fn test_zero_realizations_fail_with_config_error() {
    let tmp = TempDir::new().expect("temp file creation should succeed");
    let args = ["-q", "run", "-t", "germany", "-d", path(tmp.path()), "-r", "0"];
    let err = run_command(cli(&args)).unwrap_err();
    assert!(err.starts_with("Config error"), "unexpected message: {err}");
    assert!(err.contains("realizations"), "unexpected message: {err}");
}

#[test]
fn test_unknown_topology_rejected_by_parser() {
    let result = Cli::try_parse_from(["gemelo", "run", "-t", "mesh"]);
    assert!(result.is_err());
}
