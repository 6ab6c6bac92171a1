use std::path::Path;

use anyhow::Result;

use codescale_core::colors::DefaultTheme;
use codescale_core::output::{self as core_output, OutputFormat};
use codescale_core::report::EvaluationResult;

use super::{load_evaluator, parse_format, read_source};
use crate::output;

pub fn format_result(result: &EvaluationResult, fmt: OutputFormat) -> Result<String> {
    Ok(match fmt {
        OutputFormat::Json => core_output::format_json(result)?,
        OutputFormat::Text => core_output::format_text(result),
        OutputFormat::Pretty => output::format_pretty(result, &DefaultTheme),
    })
}

pub fn run(
    path: &Path,
    format: &str,
    priority: Option<&[String]>,
    config: Option<&Path>,
) -> Result<()> {
    let fmt = parse_format(format)?;
    let source = read_source(path)?;
    let evaluator = load_evaluator(config)?;
    let result = evaluator.evaluate(&source, priority);
    println!("{}", format_result(&result, fmt)?);
    Ok(())
}
