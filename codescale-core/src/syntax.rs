//! Syntax tree provider.
//!
//! Python source is parsed with tree-sitter.  The grammar's node kind strings
//! are mapped onto [`NodeKind`] in exactly one place ([`NodeKind::of`]) so the
//! analyzers can match exhaustively on a closed set of constructs instead of
//! comparing kind names all over the crate.

use tree_sitter::{Node, Parser, Tree};

use crate::error::ParseFailure;

/// Syntactic categories the analyzers care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    FunctionDef,
    ClassDef,
    /// `for` and `while` statements.
    Loop,
    /// `if` statements (`elif`/`else` clauses belong to them).
    Conditional,
    /// `try` statements.
    ExceptionScope,
    /// `except` / `except*` clauses.
    ExceptHandler,
    /// `with` statements.
    ResourceScope,
    Call,
    /// `import a.b, c as d`
    Import,
    /// `from a.b import c`
    ImportFrom,
    /// `from __future__ import …`
    FutureImport,
    /// List, set and dict comprehensions.
    Comprehension,
    BinaryOp,
    Subscript,
    Identifier,
    /// `[...]`, `{k: v}` and `{a, b}` literals.
    MutableLiteral,
    Comment,
    Other,
}

impl NodeKind {
    /// Classify a tree-sitter node.
    pub fn of(node: Node<'_>) -> Self {
        match node.kind() {
            "module" => NodeKind::Module,
            "function_definition" => NodeKind::FunctionDef,
            "class_definition" => NodeKind::ClassDef,
            "for_statement" | "while_statement" => NodeKind::Loop,
            "if_statement" => NodeKind::Conditional,
            "try_statement" => NodeKind::ExceptionScope,
            "except_clause" | "except_group_clause" => NodeKind::ExceptHandler,
            "with_statement" => NodeKind::ResourceScope,
            "call" => NodeKind::Call,
            "import_statement" => NodeKind::Import,
            "import_from_statement" => NodeKind::ImportFrom,
            "future_import_statement" => NodeKind::FutureImport,
            "list_comprehension" | "set_comprehension" | "dictionary_comprehension" => {
                NodeKind::Comprehension
            }
            "binary_operator" => NodeKind::BinaryOp,
            "subscript" => NodeKind::Subscript,
            "identifier" => NodeKind::Identifier,
            "list" | "dictionary" | "set" => NodeKind::MutableLiteral,
            "comment" => NodeKind::Comment,
            _ => NodeKind::Other,
        }
    }

    /// Constructs that open a new nesting level for readability purposes.
    pub fn is_nesting_scope(self) -> bool {
        matches!(
            self,
            NodeKind::Conditional
                | NodeKind::Loop
                | NodeKind::ExceptionScope
                | NodeKind::ResourceScope
        )
    }
}

/// An immutable piece of source together with its parse outcome.
///
/// Built once per evaluation and dropped afterwards.  A parse failure is an
/// ordinary value here; callers decide what it means for them.
pub struct CodeUnit {
    source: String,
    tree: Result<Tree, ParseFailure>,
}

impl CodeUnit {
    pub fn parse(source: impl Into<String>) -> Self {
        let mut source = source.into();
        if source.starts_with('\u{feff}') {
            source.drain(..'\u{feff}'.len_utf8());
        }
        let tree = parse(&source);
        Self { source, tree }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> Result<&Tree, &ParseFailure> {
        self.tree.as_ref()
    }

    pub fn is_parsed(&self) -> bool {
        self.tree.is_ok()
    }

    /// Source text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

/// Parse Python source.  Never panics; every problem becomes a [`ParseFailure`].
pub fn parse(source: &str) -> Result<Tree, ParseFailure> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ParseFailure::unpositioned(format!("tree-sitter language error: {e}")))?;

    let tree = parser
        .parse(source.as_bytes(), None)
        .ok_or_else(|| ParseFailure::unpositioned("parser produced no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(first_error(root));
    }
    check_layout(root, source)?;
    check_bracket_depth(root)?;
    Ok(tree)
}

/// Deepest bracket nesting the Python tokenizer accepts.
pub const MAX_BRACKET_DEPTH: usize = 200;

/// Clauses that continue a compound statement and must line up with it.
const CONTINUATION_CLAUSES: &[&str] = &[
    "elif_clause",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
];

fn failure_at(node: Node<'_>, message: &str) -> ParseFailure {
    let pos = node.start_position();
    ParseFailure {
        message: message.to_string(),
        line: pos.row + 1,
        column: pos.column + 1,
    }
}

/// Indentation and statement-form rules that tree-sitter recovers from
/// silently but Python rejects.
fn check_layout(root: Node<'_>, source: &str) -> Result<(), ParseFailure> {
    for node in walk(root) {
        match node.kind() {
            "module" => check_suite(node, None, source)?,
            "block" => check_suite(node, Some(node.parent().unwrap_or(node)), source)?,
            "print_statement" => return Err(failure_at(node, "Python 2 print statement")),
            "exec_statement" => return Err(failure_at(node, "Python 2 exec statement")),
            _ => {}
        }
        let mut cursor = node.walk();
        for clause in node.children(&mut cursor) {
            if CONTINUATION_CLAUSES.contains(&clause.kind())
                && clause.start_position().column != node.start_position().column
            {
                return Err(failure_at(clause, "unindent does not match any outer indentation level"));
            }
        }
    }
    Ok(())
}

/// Statements of a module or block must share one indentation column.  A
/// block's column must lie right of its header unless the block sits on the
/// header line (`if ready: go()`).
fn check_suite(suite: Node<'_>, header: Option<Node<'_>>, source: &str) -> Result<(), ParseFailure> {
    let mut cursor = suite.walk();
    let statements: Vec<Node<'_>> = suite
        .named_children(&mut cursor)
        .filter(|&n| NodeKind::of(n) != NodeKind::Comment)
        .collect();

    let Some(first) = statements.first() else {
        return match header {
            Some(header) => Err(failure_at(header, "expected an indented block")),
            None => Ok(()),
        };
    };

    let column = match header {
        None => 0,
        Some(header) => {
            let header_row = suite
                .prev_sibling()
                .filter(|n| NodeKind::of(*n) != NodeKind::Comment)
                .map(|n| n.end_position().row);
            if header_row == Some(first.start_position().row) {
                return Ok(());
            }
            let column = first.start_position().column;
            if column <= header.start_position().column {
                return Err(failure_at(*first, "expected an indented block"));
            }
            column
        }
    };

    for &statement in &statements {
        if starts_line(statement, source) && statement.start_position().column != column {
            return Err(failure_at(statement, "unexpected indent"));
        }
    }
    Ok(())
}

/// Whether only indentation precedes `node` on its line.
fn starts_line(node: Node<'_>, source: &str) -> bool {
    let start = node.start_byte();
    let line_start = start - node.start_position().column.min(start);
    source
        .get(line_start..start)
        .is_some_and(|prefix| prefix.chars().all(|c| matches!(c, ' ' | '\t' | '\x0c')))
}

fn check_bracket_depth(root: Node<'_>) -> Result<(), ParseFailure> {
    let mut depth = 0usize;
    for node in walk(root) {
        match node.kind() {
            "(" | "[" | "{" => {
                depth += 1;
                if depth > MAX_BRACKET_DEPTH {
                    return Err(failure_at(node, "too many nested parentheses"));
                }
            }
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn first_error(root: Node<'_>) -> ParseFailure {
    let offending = walk(root)
        .into_iter()
        .find(|n| n.is_error() || n.is_missing())
        .unwrap_or(root);
    let pos = offending.start_position();
    let message = if offending.is_missing() {
        format!("missing `{}`", offending.kind())
    } else {
        "unexpected input".to_string()
    };
    ParseFailure {
        message,
        line: pos.row + 1,
        column: pos.column + 1,
    }
}

/// All nodes under `root` (inclusive) in source order.
pub fn walk<'t>(root: Node<'t>) -> Vec<Node<'t>> {
    let mut result = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        result.push(node);
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    result
}

/// Nodes of the given kind under `root` (inclusive), in source order.
pub fn collect<'t>(root: Node<'t>, kind: NodeKind) -> Vec<Node<'t>> {
    walk(root)
        .into_iter()
        .filter(|&n| NodeKind::of(n) == kind)
        .collect()
}

/// Whether any strict descendant of `node` is of `kind`.
pub fn has_descendant(node: Node<'_>, kind: NodeKind) -> bool {
    walk(node)
        .into_iter()
        .skip(1)
        .any(|n| NodeKind::of(n) == kind)
}

/// Name of a function or class definition.
pub fn definition_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name("name")
        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
}

/// The statements of a definition's body, comments excluded.
pub fn body_statements<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let Some(body) = node.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|&n| NodeKind::of(n) != NodeKind::Comment)
        .collect()
}

/// Whether an identifier node is a name used in an expression or as an
/// assignment target, as opposed to an attribute, keyword, parameter,
/// import or definition name.
pub fn is_name_reference(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };
    let is_field = |field: &str| parent.child_by_field_name(field) == Some(node);
    match parent.kind() {
        "function_definition" | "class_definition" => !is_field("name"),
        "attribute" => !is_field("attribute"),
        "keyword_argument" => !is_field("name"),
        "default_parameter" | "typed_default_parameter" => !is_field("name"),
        "parameters" | "lambda_parameters" | "typed_parameter" => false,
        "list_splat_pattern" | "dictionary_splat_pattern" => !parent
            .parent()
            .is_some_and(|gp| matches!(gp.kind(), "parameters" | "lambda_parameters" | "typed_parameter")),
        "dotted_name" | "aliased_import" | "relative_import" => false,
        "global_statement" | "nonlocal_statement" => false,
        "except_clause" | "except_group_clause" => {
            !node.prev_sibling().is_some_and(|s| s.kind() == "as")
        }
        "as_pattern_target" => !parent
            .parent()
            .and_then(|p| p.parent())
            .is_some_and(|n| NodeKind::of(n) == NodeKind::ExceptHandler),
        _ => true,
    }
}
