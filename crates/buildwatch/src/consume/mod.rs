//! Consumer side of the fetch pipe: run or read the fetch stage, then parse
//! its buffered output into a [`Report`].

use std::fmt::Write as _;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use thiserror::Error;

use crate::config::MISSING_AUTH_MESSAGE;
use crate::models::Report;
use crate::notify::slack::STATUS_PLACEHOLDER;
use crate::utils::time::format_utc;

const STALE_SESSION_MARKER: &str = "Available session is not valid any more";

#[derive(Error, Debug)]
pub enum FetchOutputError {
    #[error("no output received from the fetch stage")]
    Empty,

    #[error(
        "auth error: missing App Store Connect credentials or API key; set ITC_USERNAME/ITC_PASSWORD or the SPACESHIP_CONNECT_API_* variables"
    )]
    MissingAuth,

    #[error("failed to parse report JSON from fetch output")]
    Parse {
        #[source]
        source: serde_json::Error,
        raw: String,
    },
}

/// Interprets the complete stdout of one fetch run.
pub fn parse_fetch_output(output: &str) -> Result<Report, FetchOutputError> {
    if output.trim().is_empty() {
        return Err(FetchOutputError::Empty);
    }
    if output.contains(MISSING_AUTH_MESSAGE) {
        return Err(FetchOutputError::MissingAuth);
    }
    if output.contains(STALE_SESSION_MARKER) {
        tracing::warn!("upstream session was stale; the fetch stage signed in again");
    }

    serde_json::from_str(output).map_err(|source| FetchOutputError::Parse {
        source,
        raw: output.to_string(),
    })
}

/// Runs `command` to completion and returns its stdout.
///
/// A non-zero exit is an error unless stdout carries something worth
/// interpreting (the missing-auth diagnostic exits non-zero too).
pub fn run_fetch_command(command: &[String]) -> Result<String> {
    let Some((program, args)) = command.split_first() else {
        bail!("fetch command is empty");
    };

    tracing::info!(program = %program, "poll: running fetch stage");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to execute fetch command `{program}`"))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        tracing::debug!(stderr = %stderr.trim(), "poll: fetch stage stderr");
    }

    if !output.status.success() && stdout.trim().is_empty() {
        bail!(
            "fetch command `{program}` failed ({}): {}",
            output.status,
            stderr.trim()
        );
    }
    Ok(stdout)
}

/// Human-readable per-app, per-build digest of a report.
#[must_use]
pub fn render_summary(report: &Report) -> String {
    let mut out = String::new();
    for app in report {
        let _ = writeln!(out, "App: {} (appId: {})", app.name, app.app_id);
        let _ = writeln!(out, "  App Version: {}", app.version);
        let _ = writeln!(
            out,
            "  App Status: {}",
            app.status.render().unwrap_or(STATUS_PLACEHOLDER)
        );
        if app.builds.is_empty() {
            let _ = writeln!(out, "  No builds found.");
        }
        for build in &app.builds {
            let _ = writeln!(out, "  Build: {}", build.version);
            let _ = writeln!(
                out,
                "    Short Version: {}",
                build.short_version.as_deref().unwrap_or_default()
            );
            let _ = writeln!(out, "    Build Status: {}", build.status);
            let _ = writeln!(
                out,
                "    TestFlight Status: {}",
                build.beta_review_state.as_deref().unwrap_or_default()
            );
            let _ = writeln!(
                out,
                "    Uploaded: {}",
                build.uploaded_at.map(format_utc).unwrap_or_default()
            );
        }
    }
    out
}
