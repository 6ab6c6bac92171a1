//! Issue detection.
//!
//! Unlike the metric analyzers this does not score anything.  It produces a
//! list of human-readable findings about the code, grouped by category and
//! reported in a fixed category order: error handling, edge cases, security,
//! performance, best practices.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::syntax::{self, CodeUnit, NodeKind};
use crate::text_scan::{self, DynamicExecution};

pub const NO_ISSUES_TEXT: &str = "No significant issues detected.";
pub const SYNTAX_ERROR_ISSUE: &str = "Code contains syntax errors";

/// Findings for one code unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    pub issues: Vec<String>,
    /// Findings joined with ` • `, or [`NO_ISSUES_TEXT`].
    pub issues_text: String,
    pub issues_count: usize,
}

impl IssueReport {
    pub fn new(issues: Vec<String>) -> Self {
        let issues_text = if issues.is_empty() {
            NO_ISSUES_TEXT.to_string()
        } else {
            issues.join(" • ")
        };
        Self {
            issues_count: issues.len(),
            issues_text,
            issues,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IssueDetector;

impl IssueDetector {
    pub fn detect(&self, unit: &CodeUnit) -> IssueReport {
        let Ok(tree) = unit.tree() else {
            return IssueReport::new(vec![SYNTAX_ERROR_ISSUE.to_string()]);
        };
        let root = tree.root_node();

        let mut issues = Vec::new();
        issues.extend(error_handling(root));
        issues.extend(edge_cases(root, unit));
        issues.extend(security(unit.source()));
        issues.extend(performance(root));
        issues.extend(best_practices(root, unit));
        IssueReport::new(issues)
    }

    pub fn detect_source(&self, source: &str) -> IssueReport {
        self.detect(&CodeUnit::parse(source))
    }
}

// ------------------------------------------------------------------
// Categories
// ------------------------------------------------------------------

fn error_handling(root: Node<'_>) -> Option<String> {
    let nodes = syntax::walk(root);
    if nodes
        .iter()
        .any(|&n| NodeKind::of(n) == NodeKind::ExceptionScope)
    {
        return None;
    }

    let division = nodes.iter().any(|&n| is_true_division(n));
    let indexing = nodes
        .iter()
        .any(|&n| NodeKind::of(n) == NodeKind::Subscript);

    let risky: Vec<&str> = [(division, "division"), (indexing, "indexing")]
        .into_iter()
        .filter_map(|(present, name)| present.then_some(name))
        .collect();
    (!risky.is_empty())
        .then(|| format!("Missing error handling for {} operations", risky.join(", ")))
}

fn is_true_division(node: Node<'_>) -> bool {
    NodeKind::of(node) == NodeKind::BinaryOp
        && node
            .child_by_field_name("operator")
            .is_some_and(|op| op.kind() == "/")
}

fn edge_cases(root: Node<'_>, unit: &CodeUnit) -> Vec<String> {
    syntax::collect(root, NodeKind::FunctionDef)
        .into_iter()
        .filter(|&func| {
            has_positional_parameters(func) && !syntax::has_descendant(func, NodeKind::Conditional)
        })
        .filter_map(|func| syntax::definition_name(func, unit.source()))
        .map(|name| {
            format!("Function '{name}' may not validate input parameters (None, empty values)")
        })
        .collect()
}

/// Whether the function declares any parameter before `*`, `*args` or `**kwargs`.
fn has_positional_parameters(func: Node<'_>) -> bool {
    let Some(params) = func.child_by_field_name("parameters") else {
        return false;
    };
    let mut cursor = params.walk();
    let found = params
        .named_children(&mut cursor)
        .take_while(|p| {
            !matches!(
                p.kind(),
                "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator"
            ) && !is_splat_typed_parameter(*p)
        })
        .any(|p| {
            matches!(
                p.kind(),
                "identifier" | "default_parameter" | "typed_parameter" | "typed_default_parameter"
            )
        });
    found
}

fn is_splat_typed_parameter(param: Node<'_>) -> bool {
    param.kind() == "typed_parameter"
        && param.named_child(0).is_some_and(|c| {
            matches!(c.kind(), "list_splat_pattern" | "dictionary_splat_pattern")
        })
}

fn security(source: &str) -> Vec<String> {
    text_scan::dynamic_execution(source)
        .into_iter()
        .map(|kind| {
            match kind {
                DynamicExecution::Eval => "Use of eval() is a security risk",
                DynamicExecution::Exec => "Use of exec() is a security risk",
                DynamicExecution::DynamicImport => "Dynamic imports may pose security risks",
            }
            .to_string()
        })
        .collect()
}

fn performance(root: Node<'_>) -> Vec<String> {
    let loops = syntax::collect(root, NodeKind::Loop);
    let nested = loops
        .iter()
        .filter(|&&l| syntax::has_descendant(l, NodeKind::Loop))
        .map(|_| "Nested loops detected - consider algorithm optimization for large inputs");
    let comprehensions = loops
        .iter()
        .filter(|&&l| syntax::has_descendant(l, NodeKind::Comprehension))
        .map(|_| "Comprehension inside loop may impact performance");
    nested.chain(comprehensions).map(str::to_string).collect()
}

fn best_practices(root: Node<'_>, unit: &CodeUnit) -> Vec<String> {
    let mut issues: Vec<String> = syntax::collect(root, NodeKind::ExceptHandler)
        .into_iter()
        .filter(|&h| is_bare_except(h))
        .map(|_| "Bare except clause found - should catch specific exceptions".to_string())
        .collect();

    let functions = syntax::collect(root, NodeKind::FunctionDef);

    for &func in &functions {
        let Some(name) = syntax::definition_name(func, unit.source()) else {
            continue;
        };
        for _ in 0..mutable_default_count(func) {
            issues.push(format!(
                "Function '{name}' uses mutable default argument - may cause unexpected behavior"
            ));
        }
    }

    for &func in &functions {
        let Some(name) = syntax::definition_name(func, unit.source()) else {
            continue;
        };
        if calls_print(func, unit) {
            issues.push(format!(
                "Function '{name}' contains print statements - consider using return values or logging"
            ));
        }
    }

    issues
}

/// An `except:` clause names no exception type, so its only named children
/// are the handler body and comments.
fn is_bare_except(handler: Node<'_>) -> bool {
    handler.kind() == "except_clause" && {
        let mut cursor = handler.walk();
        let bare = handler
            .named_children(&mut cursor)
            .all(|c| matches!(c.kind(), "block" | "comment"));
        bare
    }
}

fn mutable_default_count(func: Node<'_>) -> usize {
    let Some(params) = func.child_by_field_name("parameters") else {
        return 0;
    };
    let mut cursor = params.walk();
    let count = params
        .named_children(&mut cursor)
        .filter(|p| matches!(p.kind(), "default_parameter" | "typed_default_parameter"))
        .filter_map(|p| p.child_by_field_name("value"))
        .filter(|v| NodeKind::of(*v) == NodeKind::MutableLiteral)
        .count();
    count
}

fn calls_print(func: Node<'_>, unit: &CodeUnit) -> bool {
    syntax::collect(func, NodeKind::Call).into_iter().any(|call| {
        call.child_by_field_name("function")
            .is_some_and(|f| NodeKind::of(f) == NodeKind::Identifier && unit.text(f) == "print")
    })
}
