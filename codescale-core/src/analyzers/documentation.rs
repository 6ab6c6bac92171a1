use tree_sitter::{Node, Tree};

use crate::analyzers::MetricAnalyzer;
use crate::report::{round_to, MetricId, MetricResult};
use crate::syntax::{self, CodeUnit, NodeKind};
use crate::text_scan;

pub struct DocumentationAnalyzer;

impl MetricAnalyzer for DocumentationAnalyzer {
    fn metric(&self) -> MetricId {
        MetricId::Documentation
    }

    fn analyze_tree(&self, tree: &Tree, unit: &CodeUnit) -> MetricResult {
        let docstrings = docstring_score(tree.root_node(), unit);
        let comments = inline_comment_score(unit.source());
        let score = round_to(docstrings * 0.7 + comments * 0.3, 1);
        MetricResult::new(score, notes(docstrings, comments))
    }
}

fn docstring_score(root: Node<'_>, unit: &CodeUnit) -> f64 {
    let definitions: Vec<Node<'_>> = syntax::walk(root)
        .into_iter()
        .filter(|&n| matches!(NodeKind::of(n), NodeKind::FunctionDef | NodeKind::ClassDef))
        .collect();
    if definitions.is_empty() {
        return 7.0;
    }

    let documented: f64 = definitions
        .iter()
        .map(|&def| match docstring(def, unit) {
            Some(doc) if doc.chars().count() > 50 => 1.0,
            Some(doc) if doc.chars().count() > 20 => 0.7,
            Some(_) => 0.5,
            None => 0.0,
        })
        .sum();
    let ratio = documented / definitions.len() as f64;

    if ratio >= 0.9 {
        10.0
    } else if ratio >= 0.7 {
        8.5
    } else if ratio >= 0.5 {
        7.0
    } else if ratio >= 0.3 {
        5.0
    } else {
        3.0
    }
}

/// The cleaned docstring of a definition, `None` when absent or blank.
///
/// Implicitly concatenated literals (`"a" "b"`) form one docstring.
fn docstring(def: Node<'_>, unit: &CodeUnit) -> Option<String> {
    let first = syntax::body_statements(def).into_iter().next()?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }
    let literal = first.named_child(0)?;
    let raw = match literal.kind() {
        "string" => literal_body(unit.text(literal))?.to_string(),
        "concatenated_string" => {
            let mut cursor = literal.walk();
            let parts: Option<Vec<&str>> = literal
                .named_children(&mut cursor)
                .filter(|n| n.kind() == "string")
                .map(|n| literal_body(unit.text(n)))
                .collect();
            parts?.concat()
        }
        _ => return None,
    };
    let doc = clean_docstring(&raw);
    (!doc.is_empty()).then_some(doc)
}

/// Strip prefix and quotes from a plain string literal.  Byte strings and
/// f-strings are not docstrings.
fn literal_body(literal: &str) -> Option<&str> {
    let quote_at = literal.find(['"', '\''])?;
    let prefix = &literal[..quote_at];
    if prefix.chars().any(|c| matches!(c, 'b' | 'B' | 'f' | 'F')) {
        return None;
    }
    let quoted = &literal[quote_at..];
    ["\"\"\"", "'''", "\"", "'"]
        .into_iter()
        .find_map(|q| quoted.strip_prefix(q)?.strip_suffix(q))
}

/// Docstring cleanup the way Python's `inspect.cleandoc` does it: expand
/// tabs, strip the first line's leading whitespace, remove the common
/// indentation of the remaining lines, then drop empty lines at both ends.
/// Whitespace-only lines keep whatever is left past the margin.
fn clean_docstring(raw: &str) -> String {
    let text = expand_tabs(&raw.replace("\r\n", "\n"));
    let mut lines: Vec<&str> = text.split('\n').collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim_start().is_empty())
        .map(|l| l.chars().count() - l.trim_start().chars().count())
        .min();

    if let Some(first) = lines.first_mut() {
        *first = first.trim_start();
    }
    if let Some(margin) = margin {
        for line in lines.iter_mut().skip(1) {
            *line = line.char_indices().nth(margin).map_or("", |(i, _)| &line[i..]);
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.is_empty()).count();
    lines[leading..].join("\n")
}

/// Tabs to spaces with stops every eight columns.
fn expand_tabs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = 8 - column % 8;
                out.push_str(&" ".repeat(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

fn inline_comment_score(source: &str) -> f64 {
    match text_scan::line_stats(source).inline_comment_ratio() {
        None => 5.0,
        Some(r) if (0.05..=0.2).contains(&r) => 10.0,
        Some(r) if (0.02..0.05).contains(&r) => 7.0,
        Some(r) if r > 0.2 => 8.0,
        Some(_) => 5.0,
    }
}

fn notes(docstrings: f64, comments: f64) -> String {
    let doc_note = if docstrings >= 8.0 {
        "Excellent docstrings"
    } else if docstrings >= 6.0 {
        "Good docstrings"
    } else if docstrings >= 4.0 {
        "Missing some docstrings"
    } else {
        "Lacks proper docstrings"
    };
    let comment_note = if comments >= 7.0 {
        "appropriate inline comments"
    } else {
        "could use more inline comments"
    };
    format!("{doc_note}, {comment_note}")
}
