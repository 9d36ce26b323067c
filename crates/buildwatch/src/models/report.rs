use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Full fetch output: one record per (team, app) pass, in processing order.
pub type Report = Vec<AppRecord>;

/// App lifecycle status as it appears in a report document.
///
/// The fetch stage always writes [`StatusValue::Text`]. Consumers also accept
/// a self-describing object carrying a `formatted` rendering, and tolerate any
/// other shape by rendering a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum StatusValue {
    Text(String),
    Rendered { formatted: String },
    Other(Value),
}

impl StatusValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Preferred display form: the `formatted` rendering, else the raw text.
    #[must_use]
    pub fn render(&self) -> Option<&str> {
        let rendered = match self {
            Self::Text(text) => text.as_str(),
            Self::Rendered { formatted } => formatted.as_str(),
            Self::Other(_) => return None,
        };
        let trimmed = rendered.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

impl Default for StatusValue {
    fn default() -> Self {
        Self::Other(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub status: StatusValue,

    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub icon_url: Option<String>,

    #[serde(default)]
    pub builds: Vec<BuildRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    #[serde(default)]
    pub id: String,

    /// Build number.
    #[serde(default)]
    pub version: String,

    /// Marketing version the build was uploaded under.
    #[serde(default, alias = "short_version")]
    pub short_version: Option<String>,

    #[serde(
        default,
        alias = "uploaded_data",
        with = "time::serde::rfc3339::option"
    )]
    #[schemars(with = "Option<String>")]
    pub uploaded_at: Option<OffsetDateTime>,

    /// Processing state (`VALID`, `INVALID`, `PROCESSING`, ...).
    #[serde(default)]
    pub status: String,

    #[serde(default, alias = "beta_review_state")]
    pub beta_review_state: Option<String>,

    #[serde(default, alias = "external_build_state")]
    pub external_build_state: Option<String>,
}

#[must_use]
pub fn json_schema() -> Value {
    let schema = schemars::schema_for!(Report);
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated report schema: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppRecord, BuildRecord, StatusValue};
    use serde_json::json;

    #[test]
    fn status_accepts_plain_text_and_formatted_object() {
        let plain: StatusValue = serde_json::from_value(json!("Ready For Sale"))
            .expect("plain status should parse");
        let rendered: StatusValue = serde_json::from_value(json!({"formatted": "Ready For Sale"}))
            .expect("rendered status should parse");

        assert_eq!(plain.render(), Some("Ready For Sale"));
        assert_eq!(rendered.render(), Some("Ready For Sale"));
    }

    #[test]
    fn unknown_status_shapes_render_nothing() {
        let numeric: StatusValue =
            serde_json::from_value(json!(42)).expect("any json should parse as status");
        assert_eq!(numeric.render(), None);
        assert_eq!(StatusValue::text("   ").render(), None);
        assert_eq!(StatusValue::default().render(), None);
    }

    #[test]
    fn app_record_uses_camel_case_and_keeps_null_icon() {
        let record = AppRecord {
            name: "Sample".to_string(),
            version: "1.2.0".to_string(),
            status: StatusValue::text("READY_FOR_SALE"),
            app_id: "123".to_string(),
            icon_url: None,
            builds: Vec::new(),
        };

        let encoded = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(encoded["appId"], json!("123"));
        assert_eq!(encoded["iconUrl"], json!(null));
        assert_eq!(encoded["builds"], json!([]));
    }

    #[test]
    fn build_record_accepts_legacy_snake_case_keys() {
        let build: BuildRecord = serde_json::from_value(json!({
            "id": "b-1",
            "version": "364",
            "short_version": "4.0",
            "uploaded_data": "2026-02-05T07:00:03Z",
            "status": "VALID",
            "beta_review_state": "APPROVED"
        }))
        .expect("legacy build row should parse");

        assert_eq!(build.short_version.as_deref(), Some("4.0"));
        assert_eq!(build.beta_review_state.as_deref(), Some("APPROVED"));
        assert_eq!(build.external_build_state, None);
        assert_eq!(
            build.uploaded_at.map(|at| at.unix_timestamp()),
            Some(1_770_274_803)
        );
    }

    #[test]
    fn build_record_serializes_missing_fields_as_null() {
        let build = BuildRecord {
            id: "b-1".to_string(),
            version: "7".to_string(),
            short_version: None,
            uploaded_at: None,
            status: "PROCESSING".to_string(),
            beta_review_state: None,
            external_build_state: None,
        };

        let encoded = serde_json::to_value(&build).expect("build should serialize");
        assert_eq!(
            encoded,
            json!({
                "id": "b-1",
                "version": "7",
                "shortVersion": null,
                "uploadedAt": null,
                "status": "PROCESSING",
                "betaReviewState": null,
                "externalBuildState": null
            })
        );
    }
}
