use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use tree_sitter::{Node, Tree};

use crate::analyzers::MetricAnalyzer;
use crate::report::{MetricId, MetricResult, SYNTAX_ERROR_NOTES};
use crate::syntax::{self, CodeUnit, NodeKind};

/// Top-level modules treated as standard library.  Anything else imported is
/// counted as an external dependency.
static STANDARD_LIBRARY: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "os", "sys", "math", "random", "datetime", "time", "json", "csv", "re",
        "collections", "itertools", "functools", "typing", "pathlib", "unittest",
        "logging", "argparse", "subprocess", "threading", "multiprocessing", "io",
        "shutil", "tempfile", "glob", "pickle", "copy", "string", "textwrap", "abc",
        "contextlib", "warnings", "weakref", "ast", "dis", "inspect", "__future__",
    ]
    .into_iter()
    .collect()
});

pub fn is_standard_library(module: &str) -> bool {
    STANDARD_LIBRARY.contains(module)
}

pub struct DependencyAnalyzer;

impl MetricAnalyzer for DependencyAnalyzer {
    fn metric(&self) -> MetricId {
        MetricId::Dependencies
    }

    fn analyze_tree(&self, tree: &Tree, unit: &CodeUnit) -> MetricResult {
        let modules = imported_modules(tree.root_node(), unit);
        let external = modules.iter().filter(|m| !is_standard_library(m)).count();
        MetricResult::new(score(external), notes(external, modules.len()))
            .with_dependencies_count(external)
    }

    fn on_parse_failure(&self) -> MetricResult {
        MetricResult::new(0.0, SYNTAX_ERROR_NOTES).with_dependencies_count(0)
    }
}

/// Distinct top-level module names imported anywhere in the tree.
pub fn imported_modules(root: Node<'_>, unit: &CodeUnit) -> BTreeSet<String> {
    let mut modules = BTreeSet::new();
    for node in syntax::walk(root) {
        match NodeKind::of(node) {
            NodeKind::Import => {
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    let dotted = if name.kind() == "aliased_import" {
                        name.child_by_field_name("name")
                    } else {
                        Some(name)
                    };
                    if let Some(top) = dotted.and_then(|d| top_level(d, unit)) {
                        modules.insert(top);
                    }
                }
            }
            NodeKind::ImportFrom => {
                let module = node.child_by_field_name("module_name").and_then(|m| {
                    if m.kind() == "relative_import" {
                        // `from . import x` names no module
                        let mut cursor = m.walk();
                        let dotted = m
                            .named_children(&mut cursor)
                            .find(|c| c.kind() == "dotted_name");
                        dotted
                    } else {
                        Some(m)
                    }
                });
                if let Some(top) = module.and_then(|d| top_level(d, unit)) {
                    modules.insert(top);
                }
            }
            NodeKind::FutureImport => {
                modules.insert("__future__".to_string());
            }
            _ => {}
        }
    }
    modules
}

/// First segment of a dotted module path.
fn top_level(dotted: Node<'_>, unit: &CodeUnit) -> Option<String> {
    let first = dotted.named_child(0).unwrap_or(dotted);
    let text = unit.text(first);
    let top = text.split('.').next().unwrap_or(text).trim();
    (!top.is_empty()).then(|| top.to_string())
}

fn score(external: usize) -> f64 {
    match external {
        0 => 10.0,
        1 => 9.0,
        2 => 8.0,
        3 => 7.0,
        4 | 5 => 6.0,
        n => (10.0 - n as f64).max(3.0),
    }
}

fn notes(external: usize, total: usize) -> String {
    match external {
        0 if total == 0 => "No external dependencies".to_string(),
        0 => "Uses only standard library".to_string(),
        1 => "Minimal external dependencies".to_string(),
        2 | 3 => "Few external dependencies".to_string(),
        n => format!("Many external dependencies ({n})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn run(source: &str) -> MetricResult {
        DependencyAnalyzer.analyze(&CodeUnit::parse(source))
    }

    fn modules(source: &str) -> Vec<String> {
        let unit = CodeUnit::parse(source);
        let root = unit.tree().unwrap().root_node();
        imported_modules(root, &unit).into_iter().collect()
    }

    #[test]
    fn no_imports_is_a_perfect_score() {
        let result = run("def add(a, b):\n    return a + b\n");
        assert_eq!(result.score, 10.0);
        assert_eq!(result.dependencies_count, Some(0));
        assert_eq!(result.notes, "No external dependencies");
    }

    #[test]
    fn standard_library_only() {
        let result = run(indoc! {"
            import os
            import sys
            from collections import defaultdict
        "});
        assert_eq!(result.score, 10.0);
        assert_eq!(result.dependencies_count, Some(0));
        assert_eq!(result.notes, "Uses only standard library");
    }

    #[test]
    fn external_packages_are_counted_once_each() {
        let result = run(indoc! {"
            import numpy as np
            import numpy.linalg
            from pandas import DataFrame
            import requests, os.path
        "});
        assert_eq!(result.dependencies_count, Some(3));
        assert_eq!(result.score, 7.0);
        assert_eq!(result.notes, "Few external dependencies");
    }

    #[test]
    fn import_forms_resolve_to_top_level_names() {
        let source = indoc! {"
            from __future__ import annotations
            import xml.etree.ElementTree as ET
            from .local import helper
            from . import sibling
            from ..pkg.sub import thing
        "};
        assert_eq!(modules(source), vec!["__future__", "local", "pkg", "xml"]);
    }

    #[test]
    fn nested_imports_are_found() {
        let source = indoc! {"
            def lazy():
                import torch
                return torch
        "};
        assert_eq!(modules(source), vec!["torch"]);
    }

    #[test]
    fn score_bands() {
        assert_eq!(score(1), 9.0);
        assert_eq!(score(4), 6.0);
        assert_eq!(score(5), 6.0);
        assert_eq!(score(6), 4.0);
        assert_eq!(score(12), 3.0);
        assert_eq!(notes(1, 1), "Minimal external dependencies");
        assert_eq!(notes(7, 9), "Many external dependencies (7)");
    }

    #[test]
    fn future_is_standard_library() {
        assert!(is_standard_library("__future__"));
        assert!(!is_standard_library("numpy"));
    }
}
