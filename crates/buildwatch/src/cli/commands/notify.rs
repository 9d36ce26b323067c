use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;

use super::poll::{ReportSourceArgs, load_report};
use crate::models::Report;
use crate::notify::{
    SlackWebhook, build_attachment, detect_status_changes, status_change_message, webhook_payload,
};

#[derive(Debug, Clone, Args)]
pub struct NotifyArgs {
    #[command(flatten)]
    pub source: ReportSourceArgs,

    /// Report from the previous run; every build is announced without it.
    #[arg(long, value_name = "PATH")]
    pub previous: Option<PathBuf>,

    /// Save the current report here for the next comparison.
    #[arg(long, value_name = "PATH")]
    pub write_current: Option<PathBuf>,

    #[arg(long, value_name = "URL", env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// Print webhook payloads instead of posting them.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

pub fn run(args: &NotifyArgs) -> Result<()> {
    let webhook = match (&args.webhook_url, args.dry_run) {
        (_, true) => None,
        (Some(url), false) => Some(SlackWebhook::new(url)?),
        (None, false) => bail!("no Slack webhook configured; pass --webhook-url or set SLACK_WEBHOOK_URL"),
    };

    let current = load_report(&args.source)?;
    let previous = match &args.previous {
        Some(path) => read_previous(path)?,
        None => None,
    };

    let changes = detect_status_changes(previous.as_ref(), &current);
    tracing::info!(events = changes.len(), "notify: status changes detected");

    for change in &changes {
        let message = status_change_message(change.app, change.build);
        let attachment = build_attachment(&message, change.app, change.build);
        match &webhook {
            Some(webhook) => {
                webhook.post(&attachment).with_context(|| {
                    format!(
                        "failed to post status of build `{}` for `{}`",
                        change.build.version, change.app.name
                    )
                })?;
                tracing::info!(
                    app = %change.app.name,
                    build = %change.build.version,
                    from = change.previous.map_or("<new>", |before| before.status.as_str()),
                    to = %change.build.status,
                    "notify: posted"
                );
            }
            None => {
                let payload = serde_json::to_string_pretty(&webhook_payload(&attachment))
                    .context("failed to serialize webhook payload")?;
                println!("{payload}");
            }
        }
    }

    if let Some(path) = &args.write_current {
        write_report(path, &current)?;
        tracing::info!(path = %path.display(), "notify: current report saved");
    }
    Ok(())
}

/// A missing file means this is the first run.
fn read_previous(path: &Path) -> Result<Option<Report>> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "notify: no previous report");
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read previous report: {}", path.display()))?;
    let report = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse previous report: {}", path.display()))?;
    Ok(Some(report))
}

fn write_report(path: &Path, report: &Report) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let document = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, document)
        .with_context(|| format!("failed to write report: {}", path.display()))
}
