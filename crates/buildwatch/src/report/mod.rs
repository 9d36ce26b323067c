//! Report assembly: teams outer, apps inner, builds per app.

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use time::OffsetDateTime;

use crate::config::{AuthMode, RunConfig};
use crate::models::{AppRecord, Report, StatusValue};
use crate::normalize::normalize_builds;
use crate::resolve::{FieldResolver, first_string_at};
use crate::upstream::document::resource_id;
use crate::upstream::{Session, UpstreamError};
use crate::utils::text::string_at;
use crate::utils::time::parse_timestamp;

const ICON_WIDTH: &str = "340";
const ICON_HEIGHT: &str = "340";
const ICON_FORMAT: &str = "png";

const STATUS_POINTERS: &[&str] = &["/attributes/appStoreState", "/attributes/appVersionState"];

/// Runs the full fetch pass over every configured team and app.
///
/// Team selection failures and unresolvable app identifiers abort the run.
pub fn assemble_report<S: Session + ?Sized>(
    session: &mut S,
    config: &RunConfig,
) -> Result<Report> {
    let mut report = Report::new();

    if config.team_ids.is_empty() {
        report.extend(collect_apps(session, config)?);
        return Ok(report);
    }

    for team_id in &config.team_ids {
        tracing::info!(team_id = %team_id, "report: selecting team");
        session
            .select_team(team_id)
            .with_context(|| format!("failed to select team `{team_id}`"))?;
        report.extend(collect_apps(session, config)?);
    }

    Ok(report)
}

fn collect_apps<S: Session + ?Sized>(
    session: &mut S,
    config: &RunConfig,
) -> Result<Vec<AppRecord>> {
    let apps = resolve_apps(session, &config.app_ids)?;
    tracing::info!(apps = apps.len(), "report: apps resolved");
    apps.iter()
        .map(|app| build_app_record(session, app, config))
        .collect()
}

/// Looks up each bundle identifier in order, or lists every app when none
/// are given.
pub fn resolve_apps<S: Session + ?Sized>(
    session: &mut S,
    app_ids: &[String],
) -> Result<Vec<Value>> {
    if app_ids.is_empty() {
        return session.list_apps().context("failed to list apps");
    }

    let mut apps = Vec::with_capacity(app_ids.len());
    for bundle_id in app_ids {
        let app = session
            .find_app(bundle_id)
            .with_context(|| format!("failed to look up app `{bundle_id}`"))?
            .ok_or_else(|| UpstreamError::AppNotFound(bundle_id.clone()))?;
        apps.push(app);
    }
    Ok(apps)
}

pub fn build_app_record<S: Session + ?Sized>(
    session: &mut S,
    app: &Value,
    config: &RunConfig,
) -> Result<AppRecord> {
    let app_id = resource_id(app)
        .ok_or_else(|| anyhow!("app resource has no id"))?
        .to_string();
    let name = string_at(app, "/attributes/name").unwrap_or_default();

    let versions = session
        .app_store_versions(&app_id, config.platform)
        .with_context(|| format!("failed to fetch app store versions for `{name}` ({app_id})"))?;
    let latest = latest_version(&versions).ok_or_else(|| {
        anyhow!(
            "app `{name}` ({app_id}) has no {} app store version",
            config.platform.as_str()
        )
    })?;

    // Store icons are only exposed to web sessions.
    let icon_url = match config.auth.mode() {
        AuthMode::Credentials => string_at(latest, "/attributes/storeIcon/templateUrl")
            .map(|template| expand_icon_template(&template)),
        AuthMode::ApiKey => None,
    };

    let raw_builds = session
        .builds(&app_id)
        .with_context(|| format!("failed to fetch builds for `{name}` ({app_id})"))?;
    let pre_release_versions = session
        .pre_release_versions(&app_id, config.platform)
        .unwrap_or_else(|error| {
            tracing::debug!(app_id = %app_id, %error, "pre-release versions unavailable");
            Vec::new()
        });
    let builds = normalize_builds(
        session,
        raw_builds,
        &pre_release_versions,
        config.number_of_builds,
    );
    tracing::debug!(app_id = %app_id, builds = builds.len(), "report: app processed");

    Ok(AppRecord {
        name,
        version: string_at(latest, "/attributes/versionString").unwrap_or_default(),
        status: first_string_at(latest, "app_store_state", STATUS_POINTERS)
            .map(StatusValue::Text)
            .unwrap_or_default(),
        app_id,
        icon_url,
        builds,
    })
}

/// Most recently created version; ties and undated versions keep upstream
/// order.
#[must_use]
pub fn latest_version(versions: &[Value]) -> Option<&Value> {
    versions
        .iter()
        .enumerate()
        .max_by(|(left_index, left), (right_index, right)| {
            created_at(left)
                .cmp(&created_at(right))
                .then(right_index.cmp(left_index))
        })
        .map(|(_, version)| version)
}

#[must_use]
pub fn expand_icon_template(template: &str) -> String {
    template
        .replace("{w}", ICON_WIDTH)
        .replace("{h}", ICON_HEIGHT)
        .replace("{f}", ICON_FORMAT)
}

fn created_at(version: &Value) -> Option<OffsetDateTime> {
    FieldResolver::new("created_date")
        .strategy("created_date", || {
            string_at(version, "/attributes/createdDate")
                .map(|raw| parse_timestamp(&raw))
                .transpose()
        })
        .resolve()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{expand_icon_template, latest_version};

    #[test]
    fn expands_all_icon_placeholders() {
        assert_eq!(
            expand_icon_template("https://is1.example.com/image/thumb/{w}x{h}bb.{f}"),
            "https://is1.example.com/image/thumb/340x340bb.png"
        );
    }

    #[test]
    fn latest_version_prefers_newest_created_date() {
        let versions = vec![
            json!({"id": "old", "attributes": {"createdDate": "2025-01-01T00:00:00Z"}}),
            json!({"id": "new", "attributes": {"createdDate": "2026-01-01T00:00:00Z"}}),
            json!({"id": "undated", "attributes": {}}),
        ];
        let latest = latest_version(&versions).expect("a version should be selected");
        assert_eq!(latest["id"], json!("new"));
    }

    #[test]
    fn latest_version_keeps_upstream_order_without_dates() {
        let versions = vec![json!({"id": "first"}), json!({"id": "second"})];
        let latest = latest_version(&versions).expect("a version should be selected");
        assert_eq!(latest["id"], json!("first"));
        assert!(latest_version(&[]).is_none());
    }
}
