use tree_sitter::{Node, Tree};

use crate::analyzers::MetricAnalyzer;
use crate::report::{round_to, MetricId, MetricResult};
use crate::syntax::{self, CodeUnit, NodeKind};
use crate::text_scan;

/// Single-letter names that are conventional enough not to be penalised.
const ALLOWED_SHORT_NAMES: &[&str] = &["i", "j", "k", "x", "y", "n"];

/// Names that say nothing about what they hold.
const NON_DESCRIPTIVE_NAMES: &[&str] = &["temp", "tmp", "var", "data", "foo", "bar"];

pub struct ReadabilityAnalyzer;

impl MetricAnalyzer for ReadabilityAnalyzer {
    fn metric(&self) -> MetricId {
        MetricId::Readability
    }

    fn analyze_tree(&self, tree: &Tree, unit: &CodeUnit) -> MetricResult {
        let root = tree.root_node();
        let naming = naming_score(root, unit);
        let structure = structure_score(root);
        let comments = comment_score(unit.source());

        let score = round_to(naming * 0.4 + structure * 0.4 + comments * 0.2, 1);
        MetricResult::new(score, notes(naming, structure, comments))
    }
}

fn naming_score(root: Node<'_>, unit: &CodeUnit) -> f64 {
    let mut score: f64 = 10.0;
    for ident in syntax::collect(root, NodeKind::Identifier) {
        if !syntax::is_name_reference(ident) {
            continue;
        }
        let name = unit.text(ident);
        if name.chars().count() == 1 && !ALLOWED_SHORT_NAMES.contains(&name) {
            score -= 0.5;
        }
        if NON_DESCRIPTIVE_NAMES.contains(&name) {
            score -= 0.3;
        }
    }
    score.max(0.0)
}

fn structure_score(root: Node<'_>) -> f64 {
    let mut score: f64 = 10.0;

    for func in syntax::collect(root, NodeKind::FunctionDef) {
        let length = syntax::body_statements(func).len();
        if length > 50 {
            score -= 2.0;
        } else if length > 30 {
            score -= 1.0;
        }
    }

    let depth = max_nesting_depth(root);
    if depth > 4 {
        score -= 2.0;
    } else if depth > 3 {
        score -= 1.0;
    }

    score.max(0.0)
}

/// Deepest stack of conditional/loop/try/with statements anywhere in the tree.
///
/// An `elif` counts as an `if` nested in the previous branch's `else`, so
/// every `elif` in a chain sits one level below the one before it.
fn max_nesting_depth(root: Node<'_>) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 0)];
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        let mut elifs = 0;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let child_depth = match child.kind() {
                "elif_clause" => {
                    elifs += 1;
                    depth + elifs
                }
                "else_clause" => depth + elifs,
                _ if NodeKind::of(child).is_nesting_scope() => depth + 1,
                _ => depth,
            };
            stack.push((child, child_depth));
        }
    }
    deepest
}

fn comment_score(source: &str) -> f64 {
    match text_scan::line_stats(source).comment_ratio() {
        None => 5.0,
        Some(r) if (0.1..=0.3).contains(&r) => 10.0,
        Some(r) if (0.05..0.1).contains(&r) => 7.0,
        Some(r) if r > 0.3 => 8.0,
        Some(_) => 5.0,
    }
}

fn notes(naming: f64, structure: f64, comments: f64) -> String {
    let naming_note = if naming >= 8.0 {
        "Clear variable names"
    } else if naming >= 6.0 {
        "Variable names could be more descriptive"
    } else {
        "Poor variable naming"
    };
    let structure_note = if structure >= 8.0 {
        "well-structured"
    } else if structure >= 6.0 {
        "structure needs improvement"
    } else {
        "poorly structured"
    };
    let comment_note = if comments >= 8.0 {
        "appropriate comments"
    } else if comments >= 6.0 {
        "could use more comments"
    } else {
        "lacks sufficient comments"
    };
    [naming_note, structure_note, comment_note].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn run(source: &str) -> MetricResult {
        ReadabilityAnalyzer.analyze(&CodeUnit::parse(source))
    }

    fn parts(source: &str) -> (f64, f64) {
        let unit = CodeUnit::parse(source);
        let root = unit.tree().unwrap().root_node();
        (naming_score(root, &unit), structure_score(root))
    }

    #[test]
    fn well_written_code_scores_high() {
        let result = run(indoc! {r#"
            def calculate_average(numbers):
                """Calculate the average of a list of numbers."""
                # Check for empty list
                if not numbers:
                    return 0
                # Calculate sum and divide by count
                return sum(numbers) / len(numbers)
        "#});
        assert!(result.score > 7.0, "got {}", result.score);
        assert!(result.notes.starts_with("Clear variable names"));
    }

    #[test]
    fn single_letter_names_are_penalised_per_use() {
        let (naming, _) = parts("def f(x):\n    a = 1\n    b = 2\n    return a + b\n");
        assert_eq!(naming, 8.0);
    }

    #[test]
    fn allowed_short_names_are_free() {
        let (naming, _) = parts("for i in range(n):\n    x = i * k\n");
        assert_eq!(naming, 10.0);
    }

    #[test]
    fn non_descriptive_names_cost_less_than_single_letters() {
        let (naming, _) = parts("temp = load()\ndata = temp\n");
        // temp twice, data once
        assert!((naming - 9.1).abs() < 1e-9, "got {naming}");
    }

    #[test]
    fn naming_floors_at_zero() {
        let source: String = (0..30).map(|_| "q = z\n").collect();
        let (naming, _) = parts(&source);
        assert_eq!(naming, 0.0);
    }

    #[test]
    fn long_function_loses_structure_points() {
        let body: String = (0..31).map(|i| format!("    value_{i} = {i}\n")).collect();
        let (_, structure) = parts(&format!("def long_one():\n{body}"));
        assert_eq!(structure, 9.0);

        let body: String = (0..51).map(|i| format!("    value_{i} = {i}\n")).collect();
        let (_, structure) = parts(&format!("def longer_one():\n{body}"));
        assert_eq!(structure, 8.0);
    }

    #[test]
    fn deep_nesting_loses_structure_points() {
        let four = indoc! {"
            def walk(items):
                for item in items:
                    if item:
                        while item.more():
                            with item.lock():
                                item.step()
        "};
        assert_eq!(parts(four).1, 9.0);

        let five = indoc! {"
            def walk(items):
                for item in items:
                    if item:
                        while item.more():
                            with item.lock():
                                try:
                                    item.step()
                                except ValueError:
                                    pass
        "};
        assert_eq!(parts(five).1, 8.0);
    }

    #[test]
    fn each_elif_nests_one_level_deeper() {
        let (_, structure) = parts(indoc! {"
            if a_flag:
                pass
            elif b_flag:
                pass
            elif c_flag:
                pass
            elif d_flag:
                pass
            elif e_flag:
                pass
        "});
        assert_eq!(structure, 8.0);

        let (_, structure) = parts(indoc! {"
            if a_flag:
                pass
            elif b_flag:
                pass
            elif c_flag:
                pass
            else:
                pass
        "});
        assert_eq!(structure, 10.0);
    }

    #[test]
    fn else_body_sits_at_the_last_branch_depth() {
        // if, elif, elif, elif -> 4, the loop inside else -> 5
        let (_, structure) = parts(indoc! {"
            if a_flag:
                pass
            elif b_flag:
                pass
            elif c_flag:
                pass
            elif d_flag:
                pass
            else:
                for item in items:
                    pass
        "});
        assert_eq!(structure, 8.0);
    }

    #[test]
    fn deeply_nested_expressions_do_not_exhaust_the_stack() {
        let source = format!("x = {}1{}\n", "(".repeat(50_000), ")".repeat(50_000));
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into()).unwrap();
        let tree = parser.parse(&source, None).unwrap();
        assert_eq!(max_nesting_depth(tree.root_node()), 0);
    }

    #[test]
    fn comment_ratio_bands() {
        assert_eq!(comment_score(""), 5.0);
        assert_eq!(comment_score("# a\nx = 1\ny = 2\nz = 3\nw = 4\n"), 10.0);
        let mut seven = String::from("# note\n");
        seven.extend((0..15).map(|i| format!("v{i} = {i}\n")));
        assert_eq!(comment_score(&seven), 7.0);
        assert_eq!(comment_score("# a\n# b\nx = 1\n"), 8.0);
        assert_eq!(comment_score("x = 1\n"), 5.0);
    }

    #[test]
    fn syntax_error_scores_zero() {
        let result = run("def broken(\n    pass");
        assert_eq!(result.score, 0.0);
        assert!(result.notes.to_lowercase().contains("syntax error"));
    }
}
