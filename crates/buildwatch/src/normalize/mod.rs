//! Build list normalization for one app.
//!
//! Raw upstream builds are ordered newest-first by upload time, truncated to
//! the configured count, and each retained build is reduced to a
//! [`BuildRecord`]. Optional fields degrade to `None` independently; nothing
//! in here fails the app.

use std::collections::HashMap;

use anyhow::anyhow;
use serde_json::Value;
use time::OffsetDateTime;

use crate::models::BuildRecord;
use crate::resolve::{FieldResolver, first_string_at};
use crate::upstream::Session;
use crate::upstream::document::resource_id;
use crate::utils::text::string_at;
use crate::utils::time::parse_timestamp;

/// Build id → marketing version, derived from the pre-release version list.
pub type ShortVersionIndex = HashMap<String, String>;

const SHORT_VERSION_POINTER: &str = "/relationships/preReleaseVersion/data/attributes/version";
const BETA_REVIEW_POINTERS: &[&str] = &[
    "/relationships/betaAppReviewSubmission/data/attributes/betaReviewState",
    "/attributes/betaReviewState",
];
const EXTERNAL_STATE_POINTERS: &[&str] =
    &["/relationships/buildBetaDetail/data/attributes/externalBuildState"];

/// Normalizes one app's builds: newest first, at most `limit` records.
///
/// The pre-release version index is only built if some retained build lacks
/// its own short version.
pub fn normalize_builds<S: Session + ?Sized>(
    session: &mut S,
    builds: Vec<Value>,
    pre_release_versions: &[Value],
    limit: usize,
) -> Vec<BuildRecord> {
    let mut fallback = FallbackIndex {
        session,
        pre_release_versions,
        built: None,
    };

    newest_first(builds, limit)
        .iter()
        .map(|build| normalize_build(build, |build_id| fallback.lookup(build_id)))
        .collect()
}

/// Stable sort by upload time, descending; builds without a parseable upload
/// time sort after all dated builds.
#[must_use]
pub fn newest_first(builds: Vec<Value>, limit: usize) -> Vec<Value> {
    let mut keyed: Vec<(Option<OffsetDateTime>, Value)> = builds
        .into_iter()
        .map(|build| (uploaded_at(&build), build))
        .collect();
    keyed.sort_by(|(left, _), (right, _)| right.cmp(left));
    keyed
        .into_iter()
        .take(limit)
        .map(|(_, build)| build)
        .collect()
}

/// Reduces one hydrated build resource; `short_version_fallback` is consulted
/// only when the build's own pre-release version is unavailable.
pub fn normalize_build(
    build: &Value,
    short_version_fallback: impl FnOnce(&str) -> Option<String>,
) -> BuildRecord {
    let id = resource_id(build).unwrap_or_default().to_string();

    let short_version = FieldResolver::new("short_version")
        .strategy("pre_release_version", || {
            Ok(string_at(build, SHORT_VERSION_POINTER))
        })
        .strategy("pre_release_version_index", || {
            if id.is_empty() {
                return Err(anyhow!("build has no id"));
            }
            Ok(short_version_fallback(&id))
        })
        .resolve();

    BuildRecord {
        version: string_at(build, "/attributes/version").unwrap_or_default(),
        short_version,
        uploaded_at: uploaded_at(build),
        status: string_at(build, "/attributes/processingState").unwrap_or_default(),
        beta_review_state: first_string_at(build, "beta_review_state", BETA_REVIEW_POINTERS),
        external_build_state: first_string_at(
            build,
            "external_build_state",
            EXTERNAL_STATE_POINTERS,
        ),
        id,
    }
}

/// Maps every build referenced by a pre-release version to that version's
/// string. Entries that cannot be resolved are skipped.
pub fn build_short_version_index<S: Session + ?Sized>(
    session: &mut S,
    pre_release_versions: &[Value],
) -> ShortVersionIndex {
    let mut index = ShortVersionIndex::new();

    for pre_release_version in pre_release_versions {
        let Some(short_version) =
            first_string_at(pre_release_version, "pre_release_version", &["/attributes/version"])
        else {
            tracing::debug!(
                id = resource_id(pre_release_version).unwrap_or("<none>"),
                "pre-release version without version string skipped"
            );
            continue;
        };

        let related = FieldResolver::new("related_builds")
            .strategy("fetch_builds", || {
                let id = resource_id(pre_release_version)
                    .ok_or_else(|| anyhow!("pre-release version has no id"))?;
                Ok(Some(session.pre_release_version_builds(id)?))
            })
            .strategy("relationship", || {
                Ok(pre_release_version
                    .pointer("/relationships/builds/data")
                    .and_then(Value::as_array)
                    .cloned())
            })
            .resolve()
            .unwrap_or_default();

        for build in &related {
            if let Some(build_id) = resource_id(build) {
                index.insert(build_id.to_string(), short_version.clone());
            }
        }
    }

    index
}

struct FallbackIndex<'a, S: Session + ?Sized> {
    session: &'a mut S,
    pre_release_versions: &'a [Value],
    built: Option<ShortVersionIndex>,
}

impl<S: Session + ?Sized> FallbackIndex<'_, S> {
    fn lookup(&mut self, build_id: &str) -> Option<String> {
        let index = self.built.get_or_insert_with(|| {
            build_short_version_index(self.session, self.pre_release_versions)
        });
        index.get(build_id).cloned()
    }
}

fn uploaded_at(build: &Value) -> Option<OffsetDateTime> {
    FieldResolver::new("uploaded_at")
        .strategy("uploaded_date", || {
            string_at(build, "/attributes/uploadedDate")
                .map(|raw| parse_timestamp(&raw))
                .transpose()
        })
        .resolve()
}
