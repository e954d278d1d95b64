use super::report::{render_text, summarize};
use super::synth::synth_config;
use super::*;
use crate::config::parse_args;
use crate::sync::{SlaSeries, SyncMetrics};
use tempfile::TempDir;

fn cli(args: &[&str]) -> Cli {
    parse_args(args.iter().copied()).unwrap()
}

#[test]
fn test_describe_separates_config_errors() {
    assert!(describe(Error::InvalidEpochs(0)).starts_with("Config error"));
    assert!(describe(Error::Cancelled).starts_with("Run error"));
}

#[test]
fn test_summary_segments_and_sla() {
    let metrics = SyncMetrics {
        error_per_window: vec![-10.0, -12.0, f64::NAN, -2.0],
        drift_detected: vec![2],
        model_updated: vec![3],
        sla: Some(SlaSeries {
            predicted_violations: vec![1, 0, 2, 0],
            true_violations: vec![1, 1, 1, 0],
            correct_predictions: vec![3, 2, 2, 3],
        }),
    };
    let summary = summarize(&metrics, &[2]);
    assert_eq!(summary.windows, 4);
    assert_eq!(summary.segment_nmse_db, vec![Some(-11.0), Some(-2.0)]);
    assert_eq!(summary.mean_nmse_db, Some(-8.0));
    let sla = summary.sla.clone().unwrap();
    assert_eq!((sla.predicted_violations, sla.true_violations, sla.correct_predictions), (3, 3, 10));

    let lines = render_text(&summary);
    assert!(lines.iter().any(|l| l == "  segment 1: -2.00 dB"));
}

#[test]
fn test_all_nan_summary() {
    let metrics = SyncMetrics { error_per_window: vec![f64::NAN], ..Default::default() };
    let summary = summarize(&metrics, &[]);
    assert_eq!(summary.mean_nmse_db, None);
    assert!(render_text(&summary).contains(&"Mean NMSE: n/a".to_string()));
}

#[test]
fn test_synth_overrides() {
    let Command::Synth(args) =
        cli(&["gemelo", "synth", "-o", "d", "-t", "germany", "--flows", "4", "--delay-budget", "0.2"]).command
    else {
        panic!("Expected Synth command")
    };
    let config = synth_config(&args);
    assert_eq!(config.flows, 4);
    assert_eq!(config.delay_budget, Some(0.2));
}

#[test]
fn test_synth_then_report_missing_results() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().to_string_lossy().into_owned();
    run_command(cli(&["gemelo", "-q", "synth", "-o", &out, "-t", "passion", "--suffixes", "0,1"])).unwrap();
    assert!(tmp.path().join("passion/experiment_301_cv/testing.jsonl.gz").is_file());

    let missing = tmp.path().join("nothing.json").to_string_lossy().into_owned();
    let err = run_command(cli(&["gemelo", "-q", "report", &missing])).unwrap_err();
    assert!(err.starts_with("Run error"));
}

#[test]
fn test_run_without_topology_is_config_error() {
    let err = run_command(cli(&["gemelo", "-q", "run", "-d", "/data"])).unwrap_err();
    assert!(err.starts_with("Config error"), "{err}");
}

#[test]
fn test_train_zero_epochs_is_config_error() {
    let err = run_command(cli(&[
        "gemelo",
        "-q",
        "train",
        "--dataset",
        "/nonexistent",
        "--checkpoint",
        "/nonexistent/w",
        "--epochs",
        "0",
    ]))
    .unwrap_err();
    assert!(err.contains("Invalid epochs"));
}
