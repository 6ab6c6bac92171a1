use std::path::Path;

use anyhow::Result;

use codescale_core::output::{self as core_output, OutputFormat};

use super::{parse_format, read_source};
use crate::output;

pub fn run(path: &Path, format: &str) -> Result<()> {
    let fmt = parse_format(format)?;
    let source = read_source(path)?;
    let report = codescale_core::detect_issues(&source);
    let rendered = match fmt {
        OutputFormat::Json => core_output::format_json(&report)?,
        OutputFormat::Text => core_output::format_issues_text(&report),
        OutputFormat::Pretty => output::format_issues_pretty(&report),
    };
    println!("{rendered}");
    Ok(())
}
