use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The five scored quality dimensions.
///
/// Ordering follows declaration order and is used for stable map iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    Readability,
    Consistency,
    TimeComplexity,
    #[serde(rename = "code_documentation")]
    Documentation,
    #[serde(rename = "external_dependencies")]
    Dependencies,
}

impl MetricId {
    pub fn all() -> &'static [MetricId] {
        &[
            MetricId::Readability,
            MetricId::Consistency,
            MetricId::TimeComplexity,
            MetricId::Documentation,
            MetricId::Dependencies,
        ]
    }

    /// Stable wire identifier, e.g. `"time_complexity"`.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricId::Readability => "readability",
            MetricId::Consistency => "consistency",
            MetricId::TimeComplexity => "time_complexity",
            MetricId::Documentation => "code_documentation",
            MetricId::Dependencies => "external_dependencies",
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the five metric identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric `{0}` (expected one of readability, consistency, time_complexity, code_documentation, external_dependencies)")]
pub struct UnknownMetric(pub String);

impl FromStr for MetricId {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricId::all()
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Heuristic time-complexity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplexityClass {
    #[serde(rename = "O(1)")]
    Constant,
    #[serde(rename = "O(log n)")]
    Logarithmic,
    #[serde(rename = "O(n)")]
    Linear,
    #[serde(rename = "O(n log n)")]
    Linearithmic,
    #[serde(rename = "O(n²)")]
    Quadratic,
    #[serde(rename = "O(n³)")]
    Cubic,
    #[serde(rename = "O(2^n)")]
    Exponential,
    Unknown,
}

impl ComplexityClass {
    pub fn score(self) -> f64 {
        match self {
            ComplexityClass::Constant => 10.0,
            ComplexityClass::Logarithmic => 9.5,
            ComplexityClass::Linear => 9.0,
            ComplexityClass::Linearithmic => 8.0,
            ComplexityClass::Quadratic => 6.5,
            ComplexityClass::Cubic => 4.0,
            ComplexityClass::Exponential => 2.0,
            ComplexityClass::Unknown => 5.0,
        }
    }

    pub fn notes(self) -> &'static str {
        match self {
            ComplexityClass::Constant => "Constant time - excellent efficiency",
            ComplexityClass::Logarithmic => "Logarithmic time - very efficient",
            ComplexityClass::Linear => "Linear time - good efficiency",
            ComplexityClass::Linearithmic => "Linearithmic time - efficient for sorting",
            ComplexityClass::Quadratic => "Quadratic time - acceptable for small inputs",
            ComplexityClass::Cubic => "Cubic time - inefficient for large inputs",
            ComplexityClass::Exponential => "Exponential time - very inefficient",
            ComplexityClass::Unknown => "Could not determine complexity",
        }
    }
}

impl fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComplexityClass::Constant => "O(1)",
            ComplexityClass::Logarithmic => "O(log n)",
            ComplexityClass::Linear => "O(n)",
            ComplexityClass::Linearithmic => "O(n log n)",
            ComplexityClass::Quadratic => "O(n²)",
            ComplexityClass::Cubic => "O(n³)",
            ComplexityClass::Exponential => "O(2^n)",
            ComplexityClass::Unknown => "Unknown",
        })
    }
}

/// One analyzer's verdict on one code unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Always within `[0, 10]`.
    pub score: f64,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_complexity: Option<ComplexityClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies_count: Option<usize>,
}

pub const SYNTAX_ERROR_NOTES: &str = "Code has syntax errors";

impl MetricResult {
    /// Build a result, clamping the score into `[0, 10]`.
    pub fn new(score: f64, notes: impl Into<String>) -> Self {
        Self {
            score: clamp_score(score),
            notes: notes.into(),
            detected_complexity: None,
            dependencies_count: None,
        }
    }

    /// The fixed result every analyzer reports for unparseable code.
    pub fn syntax_error() -> Self {
        Self::new(0.0, SYNTAX_ERROR_NOTES)
    }

    pub fn with_complexity(mut self, class: ComplexityClass) -> Self {
        self.detected_complexity = Some(class);
        self
    }

    pub fn with_dependencies_count(mut self, count: usize) -> Self {
        self.dependencies_count = Some(count);
        self
    }
}

/// Scores for every metric plus the weighted overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub metrics: BTreeMap<MetricId, MetricResult>,
    /// Weighted average, rounded to two decimals.
    pub overall_score: f64,
    /// Set only for candidates that never reached analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    /// Terminal result for a candidate whose generation failed upstream.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            metrics: BTreeMap::new(),
            overall_score: 0.0,
            error: Some(error.into()),
        }
    }
}

/// One competing code sample as delivered by the generation side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(alias = "id")]
    pub model: String,
    #[serde(default, alias = "generated_code")]
    pub code: String,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub execution_time_ms: u64,
}

fn default_success() -> bool {
    true
}

impl Candidate {
    pub fn succeeded(model: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            code: code.into(),
            success: true,
            error: None,
            execution_time_ms: 0,
        }
    }

    pub fn failed(model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            code: String::new(),
            success: false,
            error: Some(error.into()),
            execution_time_ms: 0,
        }
    }
}

/// A candidate merged with its evaluation, in report shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub model: String,
    pub overall_score: f64,
    pub generated_code: String,
    pub metrics: BTreeMap<MetricId, MetricResult>,
    pub execution_time_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

impl CandidateResult {
    pub fn new(candidate: &Candidate, evaluation: EvaluationResult) -> Self {
        Self {
            model: candidate.model.clone(),
            overall_score: evaluation.overall_score,
            generated_code: candidate.code.clone(),
            metrics: evaluation.metrics,
            execution_time_ms: candidate.execution_time_ms,
            success: candidate.success,
            error: candidate.error.clone().or(evaluation.error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based.
    pub rank: usize,
    pub model: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_models_tested: usize,
    pub successful_evaluations: usize,
    pub failed_evaluations: usize,
    pub best_model: Option<String>,
    pub best_score: f64,
    pub best_generated_code: Option<String>,
    pub potential_issues: Option<String>,
}

/// Results, ranking and summary for one batch of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<CandidateResult>,
    pub ranking: Vec<RankingEntry>,
    pub summary: Summary,
}

/// The full report document handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub evaluation_id: String,
    pub timestamp: String,
    pub prompt: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 10.0)
    }
}

/// Round to `decimals` places, deciding on the exact stored value.
///
/// `8.95` is stored as `8.949999…` and rounds to `8.9`; exact ties go to
/// the even digit.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.decimals$}").parse().unwrap_or(value)
}
