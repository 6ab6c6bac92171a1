use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;
use walkdir::WalkDir;

use codescale_core::colors::DefaultTheme;
use codescale_core::output::{self as core_output, OutputFormat};
use codescale_core::ranking;
use codescale_core::report::{Candidate, CandidateResult, EvaluationReport};

use super::{load_evaluator, parse_format};
use crate::output;

/// A batch input file: either the full object or a bare candidate array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchFile {
    Full {
        #[serde(default)]
        prompt: String,
        #[serde(default)]
        priority: Option<Vec<String>>,
        candidates: Vec<Candidate>,
    },
    Bare(Vec<Candidate>),
}

#[derive(Debug, PartialEq)]
pub struct Batch {
    pub prompt: String,
    pub priority: Option<Vec<String>>,
    pub candidates: Vec<Candidate>,
}

impl From<BatchFile> for Batch {
    fn from(file: BatchFile) -> Self {
        match file {
            BatchFile::Full { prompt, priority, candidates } => Batch { prompt, priority, candidates },
            BatchFile::Bare(candidates) => Batch {
                prompt: String::new(),
                priority: None,
                candidates,
            },
        }
    }
}

pub fn collect_py_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("py"))
        .collect();
    files.sort();
    files
}

/// Every `.py` file under `dir` becomes a successful candidate named after
/// its file stem.
fn load_directory(dir: &Path) -> Result<Batch> {
    let files = collect_py_files(dir);
    if files.is_empty() {
        warn!(path = %dir.display(), "no .py files found");
    }
    let candidates = files
        .iter()
        .map(|path| {
            let code = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let model = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(Candidate::succeeded(model, code))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Batch {
        prompt: String::new(),
        priority: None,
        candidates,
    })
}

pub fn load_batch(path: &Path) -> Result<Batch> {
    if path.is_dir() {
        return load_directory(path);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let file: BatchFile = serde_json::from_str(&text)
        .with_context(|| format!("invalid batch file {}", path.display()))?;
    Ok(file.into())
}

pub fn format_report(report: &EvaluationReport, fmt: OutputFormat) -> Result<String> {
    Ok(match fmt {
        OutputFormat::Json => core_output::format_json(report)?,
        OutputFormat::Text => core_output::format_report_text(report),
        OutputFormat::Pretty => output::format_report_pretty(report, &DefaultTheme),
    })
}

fn stream_line(result: &CandidateResult) {
    match serde_json::to_string(result) {
        Ok(line) => eprintln!("{line}"),
        Err(err) => warn!(model = %result.model, %err, "cannot serialize streamed result"),
    }
}

pub fn run(
    path: &Path,
    prompt: Option<&str>,
    priority: Option<Vec<String>>,
    config: Option<&Path>,
    format: &str,
    stream: bool,
) -> Result<()> {
    let fmt = parse_format(format)?;
    let batch = load_batch(path)?;
    let evaluator = load_evaluator(config)?;

    let priority = priority.or(batch.priority);
    let prompt = prompt.map(str::to_owned).unwrap_or(batch.prompt);

    let outcome = if stream {
        evaluator.evaluate_batch_streaming(&batch.candidates, priority.as_deref(), stream_line)
    } else {
        evaluator.evaluate_batch(&batch.candidates, priority.as_deref())
    };
    let report = ranking::build_report(prompt, outcome);
    println!("{}", format_report(&report, fmt)?);
    Ok(())
}
