//! In-memory [`Session`] for tests.
//!
//! Serves canned resources and records every call, so tests can assert on
//! both the produced report and the exact upstream traffic.

use std::collections::{HashMap, HashSet};

use serde_json::{Value, json};

use crate::upstream::error::{Result, UpstreamError};
use crate::upstream::{Platform, Session};
use crate::utils::text::string_at;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    SelectTeam(String),
    ListApps,
    FindApp(String),
    AppStoreVersions(String),
    Builds(String),
    PreReleaseVersions(String),
    PreReleaseVersionBuilds(String),
}

#[derive(Debug, Default)]
pub struct FakeSession {
    pub calls: Vec<SessionCall>,
    current_team: Option<String>,
    apps: Vec<Value>,
    team_apps: HashMap<String, Vec<Value>>,
    versions: HashMap<String, Vec<Value>>,
    builds: HashMap<String, Vec<Value>>,
    pre_release_versions: HashMap<String, Vec<Value>>,
    pre_release_version_builds: HashMap<String, Vec<Value>>,
    failing_teams: HashSet<String>,
    failing_pre_release_versions: HashSet<String>,
}

impl FakeSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apps visible when no team (or an unconfigured team) is selected.
    #[must_use]
    pub fn with_apps(mut self, apps: Vec<Value>) -> Self {
        self.apps = apps;
        self
    }

    #[must_use]
    pub fn with_team_apps(mut self, team_id: &str, apps: Vec<Value>) -> Self {
        self.team_apps.insert(team_id.to_string(), apps);
        self
    }

    #[must_use]
    pub fn with_versions(mut self, app_id: &str, versions: Vec<Value>) -> Self {
        self.versions.insert(app_id.to_string(), versions);
        self
    }

    #[must_use]
    pub fn with_builds(mut self, app_id: &str, builds: Vec<Value>) -> Self {
        self.builds.insert(app_id.to_string(), builds);
        self
    }

    #[must_use]
    pub fn with_pre_release_versions(mut self, app_id: &str, versions: Vec<Value>) -> Self {
        self.pre_release_versions.insert(app_id.to_string(), versions);
        self
    }

    /// Builds served for one pre-release version. Versions without an entry
    /// answer the on-demand lookup with a 404.
    #[must_use]
    pub fn with_pre_release_version_builds(
        mut self,
        pre_release_version_id: &str,
        builds: Vec<Value>,
    ) -> Self {
        self.pre_release_version_builds
            .insert(pre_release_version_id.to_string(), builds);
        self
    }

    #[must_use]
    pub fn with_failing_team(mut self, team_id: &str) -> Self {
        self.failing_teams.insert(team_id.to_string());
        self
    }

    /// Makes the pre-release version listing for `app_id` fail with a 500.
    #[must_use]
    pub fn with_failing_pre_release_versions(mut self, app_id: &str) -> Self {
        self.failing_pre_release_versions.insert(app_id.to_string());
        self
    }

    #[must_use]
    pub fn count_calls(&self, predicate: impl Fn(&SessionCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    fn visible_apps(&self) -> &[Value] {
        self.current_team
            .as_ref()
            .and_then(|team| self.team_apps.get(team))
            .unwrap_or(&self.apps)
    }
}

impl Session for FakeSession {
    fn select_team(&mut self, team_id: &str) -> Result<()> {
        self.calls.push(SessionCall::SelectTeam(team_id.to_string()));
        if self.failing_teams.contains(team_id) {
            return Err(UpstreamError::TeamSelection {
                team_id: team_id.to_string(),
                reason: "unknown provider".to_string(),
            });
        }
        self.current_team = Some(team_id.to_string());
        Ok(())
    }

    fn list_apps(&mut self) -> Result<Vec<Value>> {
        self.calls.push(SessionCall::ListApps);
        Ok(self.visible_apps().to_vec())
    }

    fn find_app(&mut self, bundle_id: &str) -> Result<Option<Value>> {
        self.calls.push(SessionCall::FindApp(bundle_id.to_string()));
        Ok(self
            .visible_apps()
            .iter()
            .find(|app| string_at(app, "/attributes/bundleId").as_deref() == Some(bundle_id))
            .cloned())
    }

    fn app_store_versions(&mut self, app_id: &str, _platform: Platform) -> Result<Vec<Value>> {
        self.calls
            .push(SessionCall::AppStoreVersions(app_id.to_string()));
        Ok(self.versions.get(app_id).cloned().unwrap_or_default())
    }

    fn builds(&mut self, app_id: &str) -> Result<Vec<Value>> {
        self.calls.push(SessionCall::Builds(app_id.to_string()));
        Ok(self.builds.get(app_id).cloned().unwrap_or_default())
    }

    fn pre_release_versions(&mut self, app_id: &str, _platform: Platform) -> Result<Vec<Value>> {
        self.calls
            .push(SessionCall::PreReleaseVersions(app_id.to_string()));
        if self.failing_pre_release_versions.contains(app_id) {
            return Err(UpstreamError::Http {
                status: 500,
                url: format!("/preReleaseVersions?filter[app]={app_id}"),
                body: "internal error".to_string(),
            });
        }
        Ok(self
            .pre_release_versions
            .get(app_id)
            .cloned()
            .unwrap_or_default())
    }

    fn pre_release_version_builds(&mut self, pre_release_version_id: &str) -> Result<Vec<Value>> {
        self.calls.push(SessionCall::PreReleaseVersionBuilds(
            pre_release_version_id.to_string(),
        ));
        self.pre_release_version_builds
            .get(pre_release_version_id)
            .cloned()
            .ok_or_else(|| UpstreamError::Http {
                status: 404,
                url: format!("/preReleaseVersions/{pre_release_version_id}/builds"),
                body: String::new(),
            })
    }
}

#[must_use]
pub fn app_resource(id: &str, bundle_id: &str, name: &str) -> Value {
    json!({
        "type": "apps",
        "id": id,
        "attributes": {"bundleId": bundle_id, "name": name}
    })
}

#[must_use]
pub fn version_resource(version_string: &str, state: &str, icon_template: Option<&str>) -> Value {
    let mut attributes = json!({
        "versionString": version_string,
        "appStoreState": state,
        "createdDate": "2026-01-10T12:00:00Z"
    });
    if let Some(template) = icon_template {
        attributes["storeIcon"] = json!({"templateUrl": template});
    }
    json!({
        "type": "appStoreVersions",
        "id": format!("version-{version_string}"),
        "attributes": attributes
    })
}

/// A hydrated build without relationships; callers add them as needed.
#[must_use]
pub fn build_resource(id: &str, version: &str, uploaded_date: &str, processing_state: &str) -> Value {
    json!({
        "type": "builds",
        "id": id,
        "attributes": {
            "version": version,
            "uploadedDate": uploaded_date,
            "processingState": processing_state
        },
        "relationships": {}
    })
}
