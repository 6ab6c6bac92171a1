pub mod batch;
pub mod evaluate;
pub mod issues;
pub mod weights;

use std::io::Read as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use codescale_core::config::{ScoringConfig, DEFAULT_CONFIG_FILE};
use codescale_core::output::OutputFormat;
use codescale_core::pipeline::Evaluator;

pub fn parse_format(s: &str) -> Result<OutputFormat> {
    match s {
        "pretty" => Ok(OutputFormat::Pretty),
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => anyhow::bail!("unknown format: {other} (expected pretty, text, or json)"),
    }
}

/// Read a source file, or stdin when `path` is `-`.
pub fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Build the evaluator for a command.
///
/// An explicit `--config` must load cleanly.  The implicit
/// `./codescale.toml` is optional and falls back to defaults when invalid.
pub fn load_evaluator(config: Option<&Path>) -> Result<Evaluator> {
    if let Some(path) = config {
        let config = ScoringConfig::load(path)
            .with_context(|| format!("invalid config {}", path.display()))?;
        return Ok(Evaluator::with_config(&config));
    }

    let implicit = Path::new(DEFAULT_CONFIG_FILE);
    if implicit.is_file() {
        debug!(path = %implicit.display(), "using config from current directory");
        Ok(Evaluator::from_config_path(Some(implicit)))
    } else {
        Ok(Evaluator::with_defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn formats_parse() {
        assert_eq!(parse_format("json").unwrap(), OutputFormat::Json);
        assert_eq!(parse_format("text").unwrap(), OutputFormat::Text);
        assert_eq!(parse_format("pretty").unwrap(), OutputFormat::Pretty);
        assert!(parse_format("yaml").is_err());
    }

    #[test]
    fn explicit_invalid_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[metrics.weights]\nreadability = 0.5\n").unwrap();
        assert!(load_evaluator(Some(file.path())).is_err());
    }

    #[test]
    fn missing_source_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_source(&dir.path().join("nope.py")).is_err());
    }
}
