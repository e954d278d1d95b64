//! Report command implementation

use super::describe;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{OutputFormat, ReportArgs};
use crate::sync::SyncMetrics;
use serde::Serialize;

/// Totals of the SLA counts over a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(super) struct SlaTotals {
    pub predicted_violations: usize,
    pub true_violations: usize,
    pub correct_predictions: usize,
}

/// Summary of one results file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct RunSummary {
    pub windows: usize,
    pub drift_detected: Vec<usize>,
    pub model_updated: Vec<usize>,
    /// Mean NMSE (dB) over finite windows
    pub mean_nmse_db: Option<f64>,
    pub change_points: Vec<usize>,
    /// Mean NMSE (dB) per segment between change points
    pub segment_nmse_db: Vec<Option<f64>>,
    pub sla: Option<SlaTotals>,
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

pub(super) fn summarize(metrics: &SyncMetrics, change_points: &[usize]) -> RunSummary {
    RunSummary {
        windows: metrics.windows(),
        drift_detected: metrics.drift_detected.clone(),
        model_updated: metrics.model_updated.clone(),
        mean_nmse_db: metrics.segment_means(&[]).first().copied().and_then(finite),
        change_points: change_points.to_vec(),
        segment_nmse_db: metrics.segment_means(change_points).into_iter().map(finite).collect(),
        sla: metrics.sla.as_ref().map(|sla| SlaTotals {
            predicted_violations: sla.predicted_violations.iter().sum(),
            true_violations: sla.true_violations.iter().sum(),
            correct_predictions: sla.correct_predictions.iter().sum(),
        }),
    }
}

fn db(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2} dB"))
}

pub(super) fn render_text(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Windows: {}", summary.windows),
        format!("Drift detected: {:?}", summary.drift_detected),
        format!("Model updated: {:?}", summary.model_updated),
        format!("Mean NMSE: {}", db(summary.mean_nmse_db)),
    ];
    if !summary.change_points.is_empty() {
        lines.push(format!("Change points: {:?}", summary.change_points));
        for (i, mean) in summary.segment_nmse_db.iter().enumerate() {
            lines.push(format!("  segment {i}: {}", db(*mean)));
        }
    }
    if let Some(sla) = &summary.sla {
        lines.push(format!(
            "SLA violations: {} predicted, {} actual, {} correct verdicts",
            sla.predicted_violations, sla.true_violations, sla.correct_predictions
        ));
    }
    lines
}

pub fn run_report(args: ReportArgs, level: LogLevel) -> Result<(), String> {
    let metrics = SyncMetrics::load(&args.results).map_err(describe)?;
    let summary = summarize(&metrics, &args.change_points);

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary).map_err(|e| format!("Run error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Text => {
            log(level, LogLevel::Normal, &format!("Results: {}", args.results.display()));
            for line in render_text(&summary) {
                log(level, LogLevel::Normal, &line);
            }
        }
    }
    Ok(())
}
