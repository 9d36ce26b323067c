use serde::{Deserialize, Serialize};

use crate::models::{AppRecord, BuildRecord};
use crate::utils::time::format_utc;

pub const STATUS_PLACEHOLDER: &str = "Unknown";

pub const COLOR_GOOD: &str = "good";
pub const COLOR_WARNING: &str = "warning";
pub const COLOR_DANGER: &str = "danger";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackAttachment {
    pub color: String,
    pub text: String,
    pub fields: Vec<AttachmentField>,
}

/// Formats one app/build pair as a Slack attachment.
///
/// Field order is fixed: app version, app status, build version, short
/// version, build status, TestFlight status, upload time.
#[must_use]
pub fn build_attachment(message: &str, app: &AppRecord, build: &BuildRecord) -> SlackAttachment {
    let app_status = app.status.render().unwrap_or(STATUS_PLACEHOLDER);
    let uploaded = build.uploaded_at.map(format_utc).unwrap_or_default();

    SlackAttachment {
        color: attachment_color(build).to_string(),
        text: message.to_string(),
        fields: vec![
            field("App Version", &app.version),
            field("App Status", app_status),
            field("Build Version", &build.version),
            field("Short Version", build.short_version.as_deref().unwrap_or_default()),
            field("Build Status", &build.status),
            field(
                "TestFlight Status",
                build.beta_review_state.as_deref().unwrap_or_default(),
            ),
            field("Uploaded", &uploaded),
        ],
    }
}

#[must_use]
pub fn attachment_color(build: &BuildRecord) -> &'static str {
    let review = build.beta_review_state.as_deref();
    match (build.status.as_str(), review) {
        ("INVALID" | "FAILED", _) | (_, Some("REJECTED")) => COLOR_DANGER,
        ("VALID", None | Some("APPROVED")) => COLOR_GOOD,
        _ => COLOR_WARNING,
    }
}

fn field(title: &str, value: &str) -> AttachmentField {
    AttachmentField {
        title: title.to_string(),
        value: value.to_string(),
        short: true,
    }
}
