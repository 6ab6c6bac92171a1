use tree_sitter::{Node, Tree};

use crate::analyzers::MetricAnalyzer;
use crate::report::{ComplexityClass, MetricId, MetricResult, SYNTAX_ERROR_NOTES};
use crate::syntax::{self, CodeUnit, NodeKind};
use crate::text_scan::{self, ComplexityHints};

/// Estimates asymptotic running time from loop nesting, self-recursion and
/// a handful of keyword hints.
pub struct ComplexityAnalyzer;

impl MetricAnalyzer for ComplexityAnalyzer {
    fn metric(&self) -> MetricId {
        MetricId::TimeComplexity
    }

    fn analyze_tree(&self, tree: &Tree, unit: &CodeUnit) -> MetricResult {
        let root = tree.root_node();
        let class = classify(
            max_loop_depth(root),
            has_recursion(root, unit),
            text_scan::complexity_hints(unit.source()),
        );
        MetricResult::new(class.score(), class.notes()).with_complexity(class)
    }

    fn on_parse_failure(&self) -> MetricResult {
        MetricResult::new(0.0, SYNTAX_ERROR_NOTES).with_complexity(ComplexityClass::Unknown)
    }
}

fn classify(loop_depth: usize, recursive: bool, hints: ComplexityHints) -> ComplexityClass {
    if recursive {
        return if hints.fibonacci {
            ComplexityClass::Exponential
        } else if hints.binary_search || hints.divide {
            ComplexityClass::Logarithmic
        } else {
            ComplexityClass::Linear
        };
    }

    match loop_depth {
        0 => ComplexityClass::Constant,
        1 if hints.sort => ComplexityClass::Linearithmic,
        1 => ComplexityClass::Linear,
        2 => ComplexityClass::Quadratic,
        _ => ComplexityClass::Cubic,
    }
}

/// Deepest chain of `for`/`while` loops, looking through every other node.
fn max_loop_depth(root: Node<'_>) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 0)];
    while let Some((node, outer)) = stack.pop() {
        let depth = if NodeKind::of(node) == NodeKind::Loop {
            outer + 1
        } else {
            outer
        };
        deepest = deepest.max(depth);
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor).map(|child| (child, depth)));
    }
    deepest
}

/// Whether some function calls itself by its plain name.
fn has_recursion(root: Node<'_>, unit: &CodeUnit) -> bool {
    syntax::collect(root, NodeKind::FunctionDef)
        .into_iter()
        .any(|func| {
            let Some(name) = syntax::definition_name(func, unit.source()) else {
                return false;
            };
            syntax::collect(func, NodeKind::Call).into_iter().any(|call| {
                call.child_by_field_name("function")
                    .filter(|callee| NodeKind::of(*callee) == NodeKind::Identifier)
                    .is_some_and(|callee| unit.text(callee) == name)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn run(source: &str) -> MetricResult {
        ComplexityAnalyzer.analyze(&CodeUnit::parse(source))
    }

    fn class_of(source: &str) -> ComplexityClass {
        run(source).detected_complexity.unwrap()
    }

    #[test]
    fn straight_line_code_is_constant() {
        let result = run("def add(a, b):\n    return a + b\n");
        assert_eq!(result.detected_complexity, Some(ComplexityClass::Constant));
        assert_eq!(result.score, 10.0);
        assert_eq!(result.notes, "Constant time - excellent efficiency");
    }

    #[test]
    fn single_loop_is_linear() {
        let source = indoc! {"
            def total(items):
                acc = 0
                for item in items:
                    acc += item
                return acc
        "};
        assert_eq!(class_of(source), ComplexityClass::Linear);
    }

    #[test]
    fn single_loop_mentioning_sort_is_linearithmic() {
        let result = run(indoc! {"
            def ordered(items):
                result = Sorted(items)
                for item in result:
                    print(item)
        "});
        assert_eq!(result.detected_complexity, Some(ComplexityClass::Linearithmic));
        assert_eq!(result.score, 8.0);
    }

    #[test]
    fn double_loop_is_quadratic() {
        let source = indoc! {"
            def pairs(items):
                for a_item in items:
                    for b_item in items:
                        print(a_item, b_item)
        "};
        let result = run(source);
        assert_eq!(result.detected_complexity, Some(ComplexityClass::Quadratic));
        assert_eq!(result.score, 6.5);
    }

    #[test]
    fn triple_loop_is_cubic() {
        let result = run(indoc! {"
            def triples(items):
                for a_item in items:
                    for b_item in items:
                        while b_item:
                            b_item -= a_item
        "});
        assert_eq!(result.detected_complexity, Some(ComplexityClass::Cubic));
        assert_eq!(result.score, 4.0);
    }

    #[test]
    fn loops_nested_under_conditionals_still_count() {
        let source = indoc! {"
            for row in grid:
                if row:
                    for cell in row:
                        print(cell)
        "};
        assert_eq!(class_of(source), ComplexityClass::Quadratic);
    }

    #[test]
    fn sibling_loops_do_not_add_up() {
        let source = "for a in b:\n    pass\nfor c in d:\n    pass\n";
        assert_eq!(class_of(source), ComplexityClass::Linear);
    }

    #[test]
    fn recursive_fibonacci_is_exponential() {
        let result = run(indoc! {"
            def fibonacci(n):
                if n < 2:
                    return n
                return fibonacci(n - 1) + fibonacci(n - 2)
        "});
        assert_eq!(result.detected_complexity, Some(ComplexityClass::Exponential));
        assert_eq!(result.score, 2.0);
    }

    #[test]
    fn recursive_binary_search_is_logarithmic() {
        let source = indoc! {"
            def binary_search(items, target, lo, hi):
                if lo > hi:
                    return -1
                mid = (lo + hi) // 2
                if items[mid] < target:
                    return binary_search(items, target, mid + 1, hi)
                return binary_search(items, target, lo, mid - 1)
        "};
        assert_eq!(class_of(source), ComplexityClass::Logarithmic);
    }

    #[test]
    fn plain_recursion_is_linear() {
        let source = indoc! {"
            def countdown(n):
                if n:
                    countdown(n - 1)
        "};
        assert_eq!(class_of(source), ComplexityClass::Linear);
    }

    #[test]
    fn method_calls_with_the_same_name_are_not_recursion() {
        let source = indoc! {"
            def render(view):
                return view.render()
        "};
        assert_eq!(class_of(source), ComplexityClass::Constant);
    }

    #[test]
    fn deeply_nested_expressions_do_not_exhaust_the_stack() {
        let source = format!("x = {}1{}\n", "[".repeat(50_000), "]".repeat(50_000));
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into()).unwrap();
        let tree = parser.parse(&source, None).unwrap();
        assert_eq!(max_loop_depth(tree.root_node()), 0);
    }

    #[test]
    fn loops_in_sibling_functions_do_not_stack() {
        let source = indoc! {"
            def first(items):
                for item in items:
                    print(item)

            def second(items):
                for item in items:
                    for other in items:
                        print(item, other)
        "};
        assert_eq!(class_of(source), ComplexityClass::Quadratic);
    }

    #[test]
    fn syntax_error_reports_unknown() {
        let result = run("def broken(\n    pass");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.detected_complexity, Some(ComplexityClass::Unknown));
        assert_eq!(result.notes, SYNTAX_ERROR_NOTES);
    }
}
