//! Ranking, batch summary and report assembly.
//!
//! Everything here needs the complete set of candidate results; nothing runs
//! while candidates are still being evaluated.

use chrono::Utc;
use uuid::Uuid;

use crate::analyzers::issues::IssueDetector;
use crate::report::{BatchOutcome, CandidateResult, EvaluationReport, RankingEntry, Summary};

pub const NO_CODE_TO_ANALYZE: &str = "No code to analyze";

/// Successful candidates ordered by descending score.  Ties keep input order.
pub fn rank(results: &[CandidateResult]) -> Vec<RankingEntry> {
    let mut successful: Vec<&CandidateResult> = results.iter().filter(|r| r.success).collect();
    successful.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
    successful
        .into_iter()
        .enumerate()
        .map(|(i, r)| RankingEntry {
            rank: i + 1,
            model: r.model.clone(),
            score: r.overall_score,
        })
        .collect()
}

/// Counts plus the best candidate and its issue findings.
///
/// The best candidate is the first successful one with the highest score,
/// matching the head of [`rank`].
pub fn summarize(results: &[CandidateResult], detector: &IssueDetector) -> Summary {
    let total = results.len();
    let successful = results.iter().filter(|r| r.success).count();

    let best = results
        .iter()
        .filter(|r| r.success)
        .fold(None::<&CandidateResult>, |best, r| match best {
            Some(b) if b.overall_score >= r.overall_score => Some(b),
            _ => Some(r),
        });

    match best {
        Some(best) => {
            let issues = if best.generated_code.is_empty() {
                NO_CODE_TO_ANALYZE.to_string()
            } else {
                detector.detect_source(&best.generated_code).issues_text
            };
            Summary {
                total_models_tested: total,
                successful_evaluations: successful,
                failed_evaluations: total - successful,
                best_model: Some(best.model.clone()),
                best_score: best.overall_score,
                best_generated_code: Some(best.generated_code.clone()),
                potential_issues: Some(issues),
            }
        }
        None => Summary {
            total_models_tested: total,
            successful_evaluations: successful,
            failed_evaluations: total - successful,
            best_model: None,
            best_score: 0.0,
            best_generated_code: None,
            potential_issues: None,
        },
    }
}

pub fn rank_and_summarize(results: Vec<CandidateResult>, detector: &IssueDetector) -> BatchOutcome {
    let ranking = rank(&results);
    let summary = summarize(&results, detector);
    BatchOutcome {
        results,
        ranking,
        summary,
    }
}

/// `eval_` followed by eight hex digits of a random UUID.
pub fn new_evaluation_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("eval_{}", &hex[..8])
}

/// Current UTC time, ISO-8601 with microseconds and a `Z` suffix.
pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

pub fn build_report(prompt: impl Into<String>, outcome: BatchOutcome) -> EvaluationReport {
    EvaluationReport {
        evaluation_id: new_evaluation_id(),
        timestamp: timestamp_now(),
        prompt: prompt.into(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::report::{Candidate, EvaluationResult};

    fn scored(model: &str, score: f64, code: &str) -> CandidateResult {
        let evaluation = EvaluationResult {
            metrics: BTreeMap::new(),
            overall_score: score,
            error: None,
        };
        CandidateResult::new(&Candidate::succeeded(model, code), evaluation)
    }

    fn failed(model: &str) -> CandidateResult {
        let candidate = Candidate::failed(model, "rate limited");
        CandidateResult::new(&candidate, EvaluationResult::failed("rate limited"))
    }

    #[test]
    fn ranking_is_descending_and_one_based() {
        let results = vec![
            scored("a", 6.0, "x = 1"),
            scored("b", 8.5, "x = 1"),
            scored("c", 7.25, "x = 1"),
        ];
        let ranking = rank(&results);
        let order: Vec<(usize, &str)> = ranking.iter().map(|e| (e.rank, e.model.as_str())).collect();
        assert_eq!(order, vec![(1, "b"), (2, "c"), (3, "a")]);
    }

    #[test]
    fn ties_keep_input_order() {
        let results = vec![
            scored("first", 7.0, "x = 1"),
            scored("second", 9.0, "x = 1"),
            scored("third", 7.0, "x = 1"),
        ];
        let models: Vec<String> = rank(&results).into_iter().map(|e| e.model).collect();
        assert_eq!(models, vec!["second", "first", "third"]);
    }

    #[test]
    fn failed_candidates_are_counted_but_never_ranked() {
        let results = vec![failed("broken"), scored("ok", 5.0, "x = 1")];
        let outcome = rank_and_summarize(results, &IssueDetector);
        assert_eq!(outcome.ranking.len(), 1);
        assert!(outcome.ranking.iter().all(|e| e.model != "broken"));
        assert_eq!(outcome.summary.total_models_tested, 2);
        assert_eq!(outcome.summary.failed_evaluations, 1);
        assert_eq!(outcome.summary.best_model.as_deref(), Some("ok"));
    }

    #[test]
    fn no_successful_candidates_yields_empty_summary() {
        let outcome = rank_and_summarize(vec![failed("a"), failed("b")], &IssueDetector);
        assert!(outcome.ranking.is_empty());
        let summary = &outcome.summary;
        assert_eq!(summary.total_models_tested, 2);
        assert_eq!(summary.successful_evaluations, 0);
        assert_eq!(summary.failed_evaluations, 2);
        assert_eq!(summary.best_model, None);
        assert_eq!(summary.best_score, 0.0);
        assert_eq!(summary.best_generated_code, None);
        assert_eq!(summary.potential_issues, None);
    }

    #[test]
    fn empty_batch_is_well_formed() {
        let outcome = rank_and_summarize(Vec::new(), &IssueDetector);
        assert!(outcome.ranking.is_empty());
        assert_eq!(outcome.summary.total_models_tested, 0);
        assert_eq!(outcome.summary.best_model, None);
    }

    #[test]
    fn best_candidate_gets_issue_findings() {
        let results = vec![
            scored("worse", 3.0, "x = 1"),
            scored("best", 9.0, "value = eval(text)\n"),
        ];
        let outcome = rank_and_summarize(results, &IssueDetector);
        assert_eq!(outcome.summary.best_score, 9.0);
        assert_eq!(
            outcome.summary.potential_issues.as_deref(),
            Some("Use of eval() is a security risk")
        );
    }

    #[test]
    fn empty_best_code_is_not_analyzed() {
        let outcome = rank_and_summarize(vec![scored("silent", 4.0, "")], &IssueDetector);
        assert_eq!(outcome.summary.potential_issues.as_deref(), Some(NO_CODE_TO_ANALYZE));
        assert_eq!(outcome.summary.best_generated_code.as_deref(), Some(""));
    }

    #[test]
    fn report_identity_format() {
        let id = new_evaluation_id();
        assert_eq!(id.len(), "eval_".len() + 8);
        assert!(id.starts_with("eval_"));
        assert!(id[5..].chars().all(|c| c.is_ascii_hexdigit()));

        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        let fraction = ts.rsplit('.').next().unwrap();
        assert_eq!(fraction.len(), "123456Z".len());
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn report_flattens_outcome_fields() {
        let report = build_report("sort a list", rank_and_summarize(Vec::new(), &IssueDetector));
        let json = serde_json::to_value(&report).unwrap();
        for key in ["evaluation_id", "timestamp", "prompt", "results", "ranking", "summary"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["prompt"], "sort a list");
        assert!(json["summary"]["best_model"].is_null());
    }
}
