use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::consume::{FetchOutputError, parse_fetch_output, render_summary, run_fetch_command};
use crate::models::Report;

/// Where the report document comes from.
#[derive(Debug, Clone, Args)]
pub struct ReportSourceArgs {
    /// Read a saved report document instead of running the fetch stage.
    #[arg(long, value_name = "PATH", conflicts_with = "fetch_command")]
    pub input: Option<PathBuf>,

    /// Fetch stage to run; defaults to `buildwatch fetch`.
    #[arg(
        long,
        value_name = "PROGRAM",
        num_args = 1..,
        allow_hyphen_values = true
    )]
    pub fetch_command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Args)]
pub struct PollArgs {
    #[command(flatten)]
    pub source: ReportSourceArgs,
}

pub fn run(args: &PollArgs) -> Result<()> {
    let report = load_report(&args.source)?;

    let pretty = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    println!("=== Raw JSON ===");
    println!("{pretty}");
    println!();
    println!("=== Summary ===");
    print!("{}", render_summary(&report));

    tracing::info!(apps = report.len(), "poll: complete");
    Ok(())
}

/// Buffers the whole fetch output, then parses it.
///
/// Unparseable output is dumped to stderr before the error is returned.
pub fn load_report(source: &ReportSourceArgs) -> Result<Report> {
    let raw = match &source.input {
        Some(path) => read_document(path)?,
        None => run_fetch_command(&fetch_command(source)?)?,
    };

    match parse_fetch_output(&raw) {
        Ok(report) => Ok(report),
        Err(error) => {
            if let FetchOutputError::Parse { raw, .. } = &error {
                eprintln!("Raw output was:\n{raw}");
            }
            Err(error.into())
        }
    }
}

fn fetch_command(source: &ReportSourceArgs) -> Result<Vec<String>> {
    if let Some(command) = &source.fetch_command {
        return Ok(command.clone());
    }
    let current = std::env::current_exe().context("failed to locate the buildwatch executable")?;
    Ok(vec![current.to_string_lossy().into_owned(), "fetch".to_string()])
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report document: {}", path.display()))
}
