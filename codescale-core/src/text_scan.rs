//! Raw-text heuristics.
//!
//! Every check that looks at the source as plain text rather than through
//! the syntax tree lives here: comment line counting, indentation and quote
//! style, keyword hints for complexity classification, dangerous dynamic
//! execution and identifier case classification.  These scans do not know
//! about strings or comments, so `"# not a comment"` inside a literal is
//! still counted as a comment marker.

use std::sync::LazyLock;

use regex::Regex;

/// Line counts used by the comment-ratio bands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    /// Non-blank lines that are not comment-only.
    pub code_lines: usize,
    /// Lines whose first non-blank character is `#`.
    pub comment_lines: usize,
    /// Code lines that also contain a `#` marker.
    pub inline_comment_lines: usize,
}

impl LineStats {
    pub fn comment_ratio(&self) -> Option<f64> {
        (self.code_lines > 0).then(|| self.comment_lines as f64 / self.code_lines as f64)
    }

    pub fn inline_comment_ratio(&self) -> Option<f64> {
        (self.code_lines > 0).then(|| self.inline_comment_lines as f64 / self.code_lines as f64)
    }
}

pub fn line_stats(source: &str) -> LineStats {
    let mut stats = LineStats::default();
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            stats.comment_lines += 1;
        } else if !trimmed.is_empty() {
            stats.code_lines += 1;
            if trimmed.contains('#') {
                stats.inline_comment_lines += 1;
            }
        }
    }
    stats
}

/// Which kinds of leading whitespace appear in the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indentation {
    pub tabs: bool,
    pub spaces: bool,
}

impl Indentation {
    pub fn is_mixed(&self) -> bool {
        self.tabs && self.spaces
    }
}

pub fn indentation(source: &str) -> Indentation {
    let mut indent = Indentation::default();
    for line in source.lines() {
        match line.chars().next() {
            Some('\t') => indent.tabs = true,
            Some(' ') => indent.spaces = true,
            _ => {}
        }
    }
    indent
}

/// Raw counts of `'` and `"` characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteCounts {
    pub single: usize,
    pub double: usize,
}

impl QuoteCounts {
    /// Share of the more frequent quote character, `None` without quotes.
    pub fn dominant_ratio(&self) -> Option<f64> {
        let total = self.single + self.double;
        (total > 0).then(|| self.single.max(self.double) as f64 / total as f64)
    }
}

pub fn quote_counts(source: &str) -> QuoteCounts {
    source.chars().fold(QuoteCounts::default(), |mut acc, c| {
        match c {
            '\'' => acc.single += 1,
            '"' => acc.double += 1,
            _ => {}
        }
        acc
    })
}

/// Case-insensitive keyword hints used by the complexity classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplexityHints {
    pub fibonacci: bool,
    pub binary_search: bool,
    pub divide: bool,
    pub sort: bool,
}

pub fn complexity_hints(source: &str) -> ComplexityHints {
    let lower = source.to_lowercase();
    ComplexityHints {
        fibonacci: lower.contains("fibonacci"),
        binary_search: lower.contains("binary") && lower.contains("search"),
        divide: lower.contains("divide"),
        sort: lower.contains("sort"),
    }
}

/// Dynamic evaluation constructs spotted in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicExecution {
    Eval,
    Exec,
    DynamicImport,
}

static DYNAMIC_EXECUTION_PATTERNS: LazyLock<Vec<(Regex, DynamicExecution)>> =
    LazyLock::new(|| {
        [
            (r"\beval\s*\(", DynamicExecution::Eval),
            (r"\bexec\s*\(", DynamicExecution::Exec),
            (r"__import__\s*\(", DynamicExecution::DynamicImport),
        ]
        .into_iter()
        .filter_map(|(pattern, kind)| Regex::new(pattern).ok().map(|re| (re, kind)))
        .collect()
    });

/// Dynamic execution kinds present in `source`, in a fixed order.
pub fn dynamic_execution(source: &str) -> Vec<DynamicExecution> {
    DYNAMIC_EXECUTION_PATTERNS
        .iter()
        .filter(|(re, _)| re.is_match(source))
        .map(|&(_, kind)| kind)
        .collect()
}

/// Identifier case convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingStyle {
    SnakeCase,
    CamelCase,
    Other,
}

static SNAKE_CASE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").ok());
static CAMEL_CASE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").ok());

/// All-lowercase single words count as snake_case.
pub fn naming_style(name: &str) -> NamingStyle {
    let matches = |re: &Option<Regex>| re.as_ref().is_some_and(|re| re.is_match(name));
    if matches(&SNAKE_CASE) {
        NamingStyle::SnakeCase
    } else if matches(&CAMEL_CASE) {
        NamingStyle::CamelCase
    } else {
        NamingStyle::Other
    }
}
