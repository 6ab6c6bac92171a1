pub mod complexity;
pub mod consistency;
pub mod dependency;
pub mod documentation;
pub mod issues;
pub mod readability;

use tree_sitter::Tree;

use crate::report::{MetricId, MetricResult};
use crate::syntax::CodeUnit;

/// A stateless scorer for one quality dimension.
pub trait MetricAnalyzer: Send + Sync {
    /// The metric this analyzer reports.
    fn metric(&self) -> MetricId;

    /// Score a successfully parsed unit.
    fn analyze_tree(&self, tree: &Tree, unit: &CodeUnit) -> MetricResult;

    /// Result reported when the unit failed to parse.
    ///
    /// Defaults to [`MetricResult::syntax_error`]; analyzers with extra
    /// fields override it to keep those fields present.
    fn on_parse_failure(&self) -> MetricResult {
        MetricResult::syntax_error()
    }

    /// Fully-provided entry point; implementors never override it.
    ///
    /// Each analyzer checks the parse outcome on its own so that one
    /// analyzer never depends on another having looked first.
    fn analyze(&self, unit: &CodeUnit) -> MetricResult {
        match unit.tree() {
            Ok(tree) => self.analyze_tree(tree, unit),
            Err(_) => self.on_parse_failure(),
        }
    }
}

/// Returns the standard set of five metric analyzers.
pub fn default_analyzers() -> Vec<Box<dyn MetricAnalyzer>> {
    vec![
        Box::new(readability::ReadabilityAnalyzer),
        Box::new(consistency::ConsistencyAnalyzer),
        Box::new(complexity::ComplexityAnalyzer),
        Box::new(documentation::DocumentationAnalyzer),
        Box::new(dependency::DependencyAnalyzer),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_covers_every_metric_once() {
        let metrics: Vec<MetricId> = default_analyzers().iter().map(|a| a.metric()).collect();
        assert_eq!(metrics, MetricId::all());
    }

    #[test]
    fn every_analyzer_scores_zero_on_syntax_errors() {
        let unit = CodeUnit::parse("def broken(\n    pass");
        for analyzer in default_analyzers() {
            let result = analyzer.analyze(&unit);
            assert_eq!(result.score, 0.0, "{} should score 0", analyzer.metric());
            assert!(result.notes.to_lowercase().contains("syntax error"));
        }
    }
}
