use std::fmt::Write as _;

use serde::Serialize;

use crate::analyzers::issues::IssueReport;
use crate::report::{EvaluationReport, EvaluationResult, MetricResult};
use crate::weights::WeightVector;

/// Output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

/// Pretty-printed JSON for any report value.
pub fn format_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

fn metric_line(out: &mut String, name: &str, metric: &MetricResult) {
    let _ = write!(out, "  {name:<22} {:>4.1}  {}", metric.score, metric.notes);
    if let Some(class) = metric.detected_complexity {
        let _ = write!(out, " [{class}]");
    }
    if let Some(count) = metric.dependencies_count {
        let _ = write!(out, " [{count} external]");
    }
    out.push('\n');
}

/// Plain-text rendering of one evaluation (no colors).
pub fn format_text(result: &EvaluationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Overall: {:.2}/10", result.overall_score);
    if let Some(ref error) = result.error {
        let _ = writeln!(out, "Error: {error}");
    }
    if !result.metrics.is_empty() {
        out.push_str("\nMetrics:\n");
        for (metric, value) in &result.metrics {
            metric_line(&mut out, metric.as_str(), value);
        }
    }
    out
}

/// Plain-text rendering of a batch report (no colors).
pub fn format_report_text(report: &EvaluationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Evaluation: {} ({})", report.evaluation_id, report.timestamp);
    if !report.prompt.is_empty() {
        let _ = writeln!(out, "Prompt: {}", report.prompt);
    }

    let summary = &report.outcome.summary;
    let _ = writeln!(
        out,
        "Models: {} | Successful: {} | Failed: {}",
        summary.total_models_tested, summary.successful_evaluations, summary.failed_evaluations
    );

    if !report.outcome.ranking.is_empty() {
        out.push_str("\nRanking:\n");
        for entry in &report.outcome.ranking {
            let _ = writeln!(out, "  {:>2}. {:<24} {:.2}", entry.rank, entry.model, entry.score);
        }
    }

    let failed: Vec<_> = report.outcome.results.iter().filter(|r| !r.success).collect();
    if !failed.is_empty() {
        out.push_str("\nFailed:\n");
        for result in failed {
            let _ = writeln!(
                out,
                "  {:<24} {}",
                result.model,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    match (&summary.best_model, &summary.potential_issues) {
        (Some(best), issues) => {
            let _ = writeln!(out, "\nBest: {best} ({:.2})", summary.best_score);
            if let Some(issues) = issues {
                let _ = writeln!(out, "Potential issues: {issues}");
            }
        }
        (None, _) => out.push_str("\nNo successful candidates.\n"),
    }
    out
}

/// Plain-text rendering of issue findings.
pub fn format_issues_text(report: &IssueReport) -> String {
    if report.issues.is_empty() {
        return format!("{}\n", report.issues_text);
    }
    let mut out = String::new();
    let _ = writeln!(out, "{} issue(s):", report.issues_count);
    for issue in &report.issues {
        let _ = writeln!(out, "  - {issue}");
    }
    out
}

/// Plain-text rendering of a weight vector.
pub fn format_weights_text(weights: &WeightVector) -> String {
    let mut out = String::new();
    for (metric, weight) in weights {
        let _ = writeln!(out, "  {:<22} {weight:.4}", metric.as_str());
    }
    out
}
