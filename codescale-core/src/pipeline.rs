use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analyzers::issues::IssueDetector;
use crate::analyzers::{default_analyzers, MetricAnalyzer};
use crate::config::ScoringConfig;
use crate::ranking;
use crate::report::{
    round_to, BatchOutcome, Candidate, CandidateResult, EvaluationReport, EvaluationResult,
    MetricId, MetricResult,
};
use crate::syntax::CodeUnit;
use crate::weights::{StaticWeights, WeightProvider, WeightVector};

/// Runs the metric analyzers over code and combines their scores.
pub struct Evaluator {
    analyzers: Vec<Box<dyn MetricAnalyzer>>,
    weights: Box<dyn WeightProvider>,
    detector: IssueDetector,
}

impl Evaluator {
    /// Construct with an explicit analyzer set and weight provider.
    ///
    /// Tests use this to pin aggregation behaviour with a reduced analyzer
    /// set; production code goes through [`Evaluator::with_defaults`] or
    /// [`Evaluator::from_config_path`].
    pub fn with_analyzers(
        analyzers: Vec<Box<dyn MetricAnalyzer>>,
        weights: Box<dyn WeightProvider>,
    ) -> Self {
        Self {
            analyzers,
            weights,
            detector: IssueDetector,
        }
    }

    /// The five standard analyzers with equal base weights.
    pub fn with_defaults() -> Self {
        Self::with_analyzers(default_analyzers(), Box::new(StaticWeights))
    }

    /// The five standard analyzers with base weights from `config`.
    pub fn with_config(config: &ScoringConfig) -> Self {
        Self::with_analyzers(default_analyzers(), config.weight_provider())
    }

    /// Load base weights from a config file.
    ///
    /// A missing path means defaults.  A config that cannot be read or is
    /// invalid is logged and replaced by defaults; it never fails.
    pub fn from_config_path(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::with_defaults();
        };
        match ScoringConfig::load(path) {
            Ok(config) => {
                debug!(path = %path.display(), has_override = config.has_weight_override(), "loaded scoring config");
                Self::with_config(&config)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "falling back to default weights");
                Self::with_defaults()
            }
        }
    }

    /// Effective weights for a priority list.
    pub fn weights(&self, priority: Option<&[String]>) -> WeightVector {
        self.weights.weights(priority)
    }

    /// Score one piece of code.  Never fails; unparseable code scores 0.
    pub fn evaluate(&self, code: &str, priority: Option<&[String]>) -> EvaluationResult {
        let weights = self.weights(priority);
        self.evaluate_with_weights(code, &weights)
    }

    fn evaluate_with_weights(&self, code: &str, weights: &WeightVector) -> EvaluationResult {
        let unit = CodeUnit::parse(code);
        if let Err(failure) = unit.tree() {
            debug!(%failure, "code did not parse");
        }

        let metrics: BTreeMap<MetricId, MetricResult> = self
            .analyzers
            .iter()
            .map(|analyzer| {
                let result = analyzer.analyze(&unit);
                debug!(metric = %analyzer.metric(), score = result.score, "metric scored");
                (analyzer.metric(), result)
            })
            .collect();

        EvaluationResult {
            overall_score: overall_score(&metrics, weights),
            metrics,
            error: None,
        }
    }

    /// Evaluate one candidate.  Failed generations skip analysis entirely.
    fn evaluate_candidate(&self, candidate: &Candidate, weights: &WeightVector) -> CandidateResult {
        let evaluation = if candidate.success {
            self.evaluate_with_weights(&candidate.code, weights)
        } else {
            EvaluationResult::failed(
                candidate
                    .error
                    .clone()
                    .unwrap_or_else(|| "generation failed".to_string()),
            )
        };
        CandidateResult::new(candidate, evaluation)
    }

    /// Evaluate candidates in parallel.
    ///
    /// `on_result` sees each result as soon as it is ready, in completion
    /// order.  The returned vector is in input order.
    pub fn evaluate_candidates<F>(
        &self,
        candidates: &[Candidate],
        priority: Option<&[String]>,
        on_result: F,
    ) -> Vec<CandidateResult>
    where
        F: Fn(&CandidateResult) + Sync,
    {
        let weights = self.weights(priority);
        info!(candidates = candidates.len(), "evaluating batch");
        let results: Vec<CandidateResult> = candidates
            .par_iter()
            .map(|candidate| {
                let result = self.evaluate_candidate(candidate, &weights);
                on_result(&result);
                result
            })
            .collect();
        info!(
            successful = results.iter().filter(|r| r.success).count(),
            failed = results.iter().filter(|r| !r.success).count(),
            "batch evaluated"
        );
        results
    }

    /// Evaluate, rank and summarise a batch.
    pub fn evaluate_batch(&self, candidates: &[Candidate], priority: Option<&[String]>) -> BatchOutcome {
        self.evaluate_batch_streaming(candidates, priority, |_| {})
    }

    /// [`Evaluator::evaluate_batch`] with progressive per-candidate results.
    ///
    /// Ranking starts only after every candidate has been evaluated.
    pub fn evaluate_batch_streaming<F>(
        &self,
        candidates: &[Candidate],
        priority: Option<&[String]>,
        on_result: F,
    ) -> BatchOutcome
    where
        F: Fn(&CandidateResult) + Sync,
    {
        let results = self.evaluate_candidates(candidates, priority, on_result);
        ranking::rank_and_summarize(results, &self.detector)
    }

    /// Full report document for a batch.
    pub fn report(
        &self,
        prompt: &str,
        candidates: &[Candidate],
        priority: Option<&[String]>,
    ) -> EvaluationReport {
        ranking::build_report(prompt, self.evaluate_batch(candidates, priority))
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Weighted sum over the metrics present in both maps, rounded to two
/// decimals.  Weights for metrics that were not computed are skipped and the
/// rest are not renormalised.
pub fn overall_score(metrics: &BTreeMap<MetricId, MetricResult>, weights: &WeightVector) -> f64 {
    let total: f64 = weights
        .iter()
        .filter_map(|(metric, weight)| metrics.get(metric).map(|m| m.score * weight))
        .sum();
    round_to(total, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::readability::ReadabilityAnalyzer;
    use std::sync::Mutex;

    const GOOD: &str = "def add(first, second):\n    return first + second\n";

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn every_metric_is_reported() {
        let result = Evaluator::with_defaults().evaluate(GOOD, None);
        let keys: Vec<MetricId> = result.metrics.keys().copied().collect();
        assert_eq!(keys, MetricId::all());
        assert!(result.error.is_none());
        assert!(result.overall_score > 0.0 && result.overall_score <= 10.0);
    }

    #[test]
    fn priority_changes_weighting_not_the_metric_set() {
        let evaluator = Evaluator::with_defaults();
        let list = ids(&["time_complexity"]);
        let result = evaluator.evaluate(GOOD, Some(&list[..]));
        assert_eq!(result.metrics.len(), 5);
        assert_eq!(
            result.overall_score,
            result.metrics[&MetricId::TimeComplexity].score
        );
    }

    #[test]
    fn overall_score_is_the_rounded_weighted_sum() {
        let metrics: BTreeMap<MetricId, MetricResult> = [
            (MetricId::Readability, MetricResult::new(7.3, "")),
            (MetricId::Consistency, MetricResult::new(8.1, "")),
        ]
        .into_iter()
        .collect();
        let weights: WeightVector = [(MetricId::Readability, 1.0 / 3.0), (MetricId::Consistency, 2.0 / 3.0)]
            .into_iter()
            .collect();
        assert_eq!(overall_score(&metrics, &weights), 7.83);
    }

    #[test]
    fn weights_for_missing_metrics_are_skipped_without_renormalising() {
        let evaluator = Evaluator::with_analyzers(vec![Box::new(ReadabilityAnalyzer)], Box::new(StaticWeights));
        let result = evaluator.evaluate(GOOD, None);
        assert_eq!(result.metrics.len(), 1);
        let readability = result.metrics[&MetricId::Readability].score;
        // Only a fifth of the readability score survives.
        assert_eq!(result.overall_score, round_to(readability * 0.2, 2));
    }

    #[test]
    fn syntax_errors_score_zero_overall() {
        let result = Evaluator::with_defaults().evaluate("def broken(\n    pass", None);
        assert_eq!(result.overall_score, 0.0);
        assert!(result.metrics.values().all(|m| m.score == 0.0));
    }

    #[test]
    fn layout_errors_and_runaway_nesting_score_zero() {
        let deep = format!("x = {}1{}\n", "(".repeat(50_000), ")".repeat(50_000));
        let sources = [
            "print \"hello\"\n".to_string(),
            "x = 1\n\tif x:\n        pass\n".to_string(),
            "class A:\n".to_string(),
            deep,
        ];
        let evaluator = Evaluator::with_defaults();
        for source in &sources {
            let result = evaluator.evaluate(source, None);
            assert_eq!(result.overall_score, 0.0, "{:?}", &source[..source.len().min(40)]);
            assert!(result.metrics.values().all(|m| m.score == 0.0));
        }
    }

    #[test]
    fn deep_candidate_does_not_take_down_the_batch() {
        let candidates = vec![
            Candidate::succeeded("deep", format!("x = {}1{}\n", "[".repeat(50_000), "]".repeat(50_000))),
            Candidate::succeeded("plain", GOOD),
        ];
        let outcome = Evaluator::with_defaults().evaluate_batch(&candidates, None);
        assert_eq!(outcome.ranking[0].model, "plain");
        assert_eq!(outcome.results[0].overall_score, 0.0);
    }

    #[test]
    fn failed_candidates_short_circuit() {
        let candidates = vec![
            Candidate::failed("down", "upstream timeout"),
            Candidate::succeeded("up", GOOD),
        ];
        let results = Evaluator::with_defaults().evaluate_candidates(&candidates, None, |_| {});
        assert_eq!(results[0].model, "down");
        assert!(results[0].metrics.is_empty());
        assert_eq!(results[0].overall_score, 0.0);
        assert_eq!(results[0].error.as_deref(), Some("upstream timeout"));
        assert_eq!(results[1].model, "up");
        assert_eq!(results[1].metrics.len(), 5);
    }

    #[test]
    fn every_candidate_is_emitted_and_results_keep_input_order() {
        let candidates: Vec<Candidate> = (0..16)
            .map(|i| Candidate::succeeded(format!("model-{i}"), format!("value_{i} = {i}\n")))
            .collect();
        let seen = Mutex::new(Vec::new());
        let results = Evaluator::with_defaults().evaluate_candidates(&candidates, None, |r| {
            seen.lock().unwrap().push(r.model.clone());
        });

        let order: Vec<&str> = results.iter().map(|r| r.model.as_str()).collect();
        let expected: Vec<String> = (0..16).map(|i| format!("model-{i}")).collect();
        assert_eq!(order, expected);

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        let mut expected_sorted = expected.clone();
        expected_sorted.sort();
        assert_eq!(seen, expected_sorted);
    }

    #[test]
    fn unreadable_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let evaluator = Evaluator::from_config_path(Some(&dir.path().join("missing.toml")));
        assert_eq!(evaluator.weights(None), StaticWeights.base_weights());
    }
}
