use colored::Colorize;
use codescale_core::analyzers::issues::IssueReport;
use codescale_core::colors::{ColorTheme, ScoreBand};
use codescale_core::report::{EvaluationReport, EvaluationResult, MetricResult};
use codescale_core::weights::WeightVector;

fn colored_score(score: f64, decimals: usize, theme: &dyn ColorTheme) -> String {
    let text = format!("{score:.decimals$}");
    text.color(theme.terminal_color(ScoreBand::of(score))).bold().to_string()
}

fn score_bar(score: f64, theme: &dyn ColorTheme) -> String {
    let bar_len = (score.clamp(0.0, 10.0) * 3.0).round() as usize;
    "█".repeat(bar_len)
        .color(theme.terminal_color(ScoreBand::of(score)))
        .to_string()
}

fn metric_line(name: &str, metric: &MetricResult, theme: &dyn ColorTheme) -> String {
    let mut extra = String::new();
    if let Some(class) = metric.detected_complexity {
        extra.push_str(&format!(" {}", format!("[{class}]").dimmed()));
    }
    if let Some(count) = metric.dependencies_count {
        extra.push_str(&format!(" {}", format!("[{count} external]").dimmed()));
    }
    format!(
        "  {:<22} {:<30} {} {}{}\n",
        name,
        score_bar(metric.score, theme),
        colored_score(metric.score, 1, theme),
        metric.notes,
        extra,
    )
}

/// Format one evaluation with terminal colors, using the supplied [`ColorTheme`].
pub fn format_pretty(result: &EvaluationResult, theme: &dyn ColorTheme) -> String {
    let mut out = format!(
        "{} {}\n",
        "Overall:".bold(),
        colored_score(result.overall_score, 2, theme)
    );
    if let Some(ref error) = result.error {
        out.push_str(&format!("{} {}\n", "Error:".bold(), error.red()));
    }
    if !result.metrics.is_empty() {
        out.push_str(&format!("\n{}\n", "Metrics:".bold()));
        for (metric, value) in &result.metrics {
            out.push_str(&metric_line(metric.as_str(), value, theme));
        }
    }
    out
}

/// Format a batch report: ranking table, failures and the best candidate.
pub fn format_report_pretty(report: &EvaluationReport, theme: &dyn ColorTheme) -> String {
    let summary = &report.outcome.summary;
    let mut out = format!(
        "{} {} {}\n",
        "Evaluation:".bold(),
        report.evaluation_id,
        format!("({})", report.timestamp).dimmed()
    );
    if !report.prompt.is_empty() {
        out.push_str(&format!("{} {}\n", "Prompt:".bold(), report.prompt));
    }
    out.push_str(&format!(
        "{} {} | {} {} | {} {}\n",
        "Models:".dimmed(),
        summary.total_models_tested,
        "Successful:".dimmed(),
        summary.successful_evaluations,
        "Failed:".dimmed(),
        summary.failed_evaluations,
    ));

    if !report.outcome.ranking.is_empty() {
        out.push_str(&format!("\n{}\n", "Ranking:".bold()));
        for entry in &report.outcome.ranking {
            out.push_str(&format!(
                "  {:>2}. {:<24} {:<30} {}\n",
                entry.rank,
                entry.model,
                score_bar(entry.score, theme),
                colored_score(entry.score, 2, theme),
            ));
        }
    }

    let failed: Vec<_> = report.outcome.results.iter().filter(|r| !r.success).collect();
    if !failed.is_empty() {
        out.push_str(&format!("\n{}\n", "Failed:".bold()));
        for result in failed {
            out.push_str(&format!(
                "  {:<24} {}\n",
                result.model,
                result.error.as_deref().unwrap_or("unknown error").red()
            ));
        }
    }

    match summary.best_model {
        Some(ref best) => {
            out.push_str(&format!(
                "\n{} {} ({})\n",
                "Best:".bold(),
                best.bold(),
                colored_score(summary.best_score, 2, theme)
            ));
            if let Some(ref issues) = summary.potential_issues {
                out.push_str(&format!("{} {}\n", "Potential issues:".dimmed(), issues));
            }
        }
        None => out.push_str(&format!("\n{}\n", "No successful candidates.".dimmed())),
    }
    out
}

pub fn format_issues_pretty(report: &IssueReport) -> String {
    if report.is_clean() {
        return format!("{}\n", report.issues_text.green());
    }
    let mut out = format!("{}\n", format!("{} issue(s):", report.issues_count).bold());
    for issue in &report.issues {
        out.push_str(&format!("  {} {}\n", "•".yellow(), issue));
    }
    out
}

pub fn format_weights_pretty(weights: &WeightVector) -> String {
    let mut out = format!("{}\n", "Weights:".bold());
    for (metric, weight) in weights {
        let bar = "█".repeat((weight * 30.0).round() as usize);
        out.push_str(&format!("  {:<22} {:<30} {weight:.4}\n", metric.as_str(), bar.cyan()));
    }
    out
}
