use std::path::Path;

use anyhow::Result;

use codescale_core::output::{self as core_output, OutputFormat};

use super::{load_evaluator, parse_format};
use crate::output;

pub fn run(priority: Option<&[String]>, config: Option<&Path>, format: &str) -> Result<()> {
    let fmt = parse_format(format)?;
    let weights = load_evaluator(config)?.weights(priority);
    let rendered = match fmt {
        OutputFormat::Json => core_output::format_json(&weights)?,
        OutputFormat::Text => core_output::format_weights_text(&weights),
        OutputFormat::Pretty => output::format_weights_pretty(&weights),
    };
    println!("{rendered}");
    Ok(())
}
