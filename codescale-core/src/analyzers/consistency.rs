use std::collections::HashMap;

use tree_sitter::{Node, Tree};

use crate::analyzers::MetricAnalyzer;
use crate::report::{round_to, MetricId, MetricResult};
use crate::syntax::{self, CodeUnit, NodeKind};
use crate::text_scan::{self, NamingStyle};

pub struct ConsistencyAnalyzer;

impl MetricAnalyzer for ConsistencyAnalyzer {
    fn metric(&self) -> MetricId {
        MetricId::Consistency
    }

    fn analyze_tree(&self, tree: &Tree, unit: &CodeUnit) -> MetricResult {
        let naming = naming_consistency(tree.root_node(), unit);
        let style = style_consistency(unit.source());
        let score = round_to(naming * 0.6 + style * 0.4, 1);
        MetricResult::new(score, notes(naming, style))
    }
}

/// Function names plus every name reference, in source order.
fn declared_and_used_names<'u>(root: Node<'_>, unit: &'u CodeUnit) -> Vec<&'u str> {
    syntax::walk(root)
        .into_iter()
        .filter_map(|node| match NodeKind::of(node) {
            NodeKind::FunctionDef => syntax::definition_name(node, unit.source()),
            NodeKind::Identifier if syntax::is_name_reference(node) => Some(unit.text(node)),
            _ => None,
        })
        .collect()
}

fn naming_consistency(root: Node<'_>, unit: &CodeUnit) -> f64 {
    let names = declared_and_used_names(root, unit);
    if names.is_empty() {
        return 5.0;
    }

    let mut counts: HashMap<NamingStyle, usize> = HashMap::new();
    for name in &names {
        *counts.entry(text_scan::naming_style(name)).or_default() += 1;
    }
    let snake = counts.get(&NamingStyle::SnakeCase).copied().unwrap_or(0);
    let camel = counts.get(&NamingStyle::CamelCase).copied().unwrap_or(0);
    let ratio = snake.max(camel) as f64 / names.len() as f64;

    if ratio >= 0.9 {
        10.0
    } else if ratio >= 0.8 {
        8.0
    } else if ratio >= 0.7 {
        6.0
    } else {
        4.0
    }
}

fn style_consistency(source: &str) -> f64 {
    let mut score: f64 = 10.0;
    if text_scan::indentation(source).is_mixed() {
        score -= 3.0;
    }
    if text_scan::quote_counts(source)
        .dominant_ratio()
        .is_some_and(|r| r < 0.8)
    {
        score -= 1.0;
    }
    score.max(0.0)
}

fn notes(naming: f64, style: f64) -> String {
    let naming_note = if naming >= 8.0 {
        "Consistent naming conventions"
    } else if naming >= 6.0 {
        "Mostly consistent naming"
    } else {
        "Inconsistent naming conventions"
    };
    let style_note = if style >= 8.0 {
        "uniform code style"
    } else {
        "style inconsistencies found"
    };
    format!("{naming_note}, {style_note}")
}
