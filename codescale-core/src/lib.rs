#![deny(dead_code)]

pub mod analyzers;
pub mod colors;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod ranking;
pub mod report;
pub mod syntax;
pub mod text_scan;
pub mod weights;

use analyzers::issues::{IssueDetector, IssueReport};
use pipeline::Evaluator;
use report::{BatchOutcome, Candidate, EvaluationReport, EvaluationResult};

/// Score a piece of Python code with the default evaluator.
///
/// `priority` is an optional ordered list of metric ids; see
/// [`weights::WeightProvider::weights`].
pub fn evaluate(code: &str, priority: Option<&[String]>) -> EvaluationResult {
    Evaluator::with_defaults().evaluate(code, priority)
}

/// Evaluate, rank and summarise a batch of candidates with the default
/// evaluator, returning the full report document.
pub fn evaluate_batch(
    prompt: &str,
    candidates: &[Candidate],
    priority: Option<&[String]>,
) -> EvaluationReport {
    Evaluator::with_defaults().report(prompt, candidates, priority)
}

/// Results, ranking and summary without the report envelope.
pub fn rank_candidates(candidates: &[Candidate], priority: Option<&[String]>) -> BatchOutcome {
    Evaluator::with_defaults().evaluate_batch(candidates, priority)
}

/// Run only the issue detector over `code`.
pub fn detect_issues(code: &str) -> IssueReport {
    IssueDetector.detect_source(code)
}
