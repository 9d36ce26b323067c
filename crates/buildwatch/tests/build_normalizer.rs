use buildwatch::fakes::{FakeSession, SessionCall, build_resource};
use buildwatch::normalize::{build_short_version_index, normalize_builds};
use serde_json::{Value, json};

fn with_pre_release_version(mut build: Value, version: &str) -> Value {
    build["relationships"]["preReleaseVersion"] = json!({
        "data": {"type": "preReleaseVersions", "id": format!("prv-{version}"), "attributes": {"version": version}}
    });
    build
}

fn pre_release_version(id: &str, version: &str, build_ids: &[&str]) -> Value {
    let builds: Vec<Value> = build_ids
        .iter()
        .map(|build_id| json!({"type": "builds", "id": build_id}))
        .collect();
    json!({
        "type": "preReleaseVersions",
        "id": id,
        "attributes": {"version": version, "platform": "IOS"},
        "relationships": {"builds": {"data": builds}}
    })
}

fn index_lookups(session: &FakeSession) -> usize {
    session.count_calls(|call| matches!(call, SessionCall::PreReleaseVersionBuilds(_)))
}

#[test]
fn returns_min_of_available_and_limit_sorted_descending() {
    let builds = vec![
        build_resource("b1", "1", "2026-03-01T00:00:00Z", "VALID"),
        build_resource("b2", "2", "2026-03-03T00:00:00Z", "VALID"),
        build_resource("b3", "3", "2026-03-02T00:00:00Z", "VALID"),
    ];
    let mut session = FakeSession::new();

    let two = normalize_builds(&mut session, builds.clone(), &[], 2);
    let ids: Vec<_> = two.iter().map(|build| build.id.as_str()).collect();
    assert_eq!(ids, vec!["b2", "b3"]);

    let all = normalize_builds(&mut session, builds, &[], 10);
    assert_eq!(all.len(), 3);
    assert!(
        all.windows(2)
            .all(|pair| pair[0].uploaded_at >= pair[1].uploaded_at)
    );
}

#[test]
fn direct_short_versions_never_build_the_index() {
    let builds = vec![
        with_pre_release_version(build_resource("b1", "1", "2026-03-01T00:00:00Z", "VALID"), "1.0"),
        with_pre_release_version(build_resource("b2", "2", "2026-03-02T00:00:00Z", "VALID"), "1.1"),
    ];
    let prvs = vec![pre_release_version("prv-1", "1.0", &["b1"])];
    let mut session = FakeSession::new().with_pre_release_version_builds("prv-1", Vec::new());

    let records = normalize_builds(&mut session, builds, &prvs, 5);

    assert_eq!(records[0].short_version.as_deref(), Some("1.1"));
    assert_eq!(records[1].short_version.as_deref(), Some("1.0"));
    assert_eq!(index_lookups(&session), 0);
}

#[test]
fn index_is_built_once_per_app_pass() {
    let builds = vec![
        build_resource("b1", "1", "2026-03-01T00:00:00Z", "VALID"),
        build_resource("b2", "2", "2026-03-02T00:00:00Z", "VALID"),
    ];
    let prvs = vec![pre_release_version("prv-1", "3.0", &[])];
    let mut session = FakeSession::new().with_pre_release_version_builds(
        "prv-1",
        vec![json!({"type": "builds", "id": "b1"}), json!({"type": "builds", "id": "b2"})],
    );

    let records = normalize_builds(&mut session, builds, &prvs, 5);

    assert!(
        records
            .iter()
            .all(|record| record.short_version.as_deref() == Some("3.0"))
    );
    assert_eq!(index_lookups(&session), 1);
}

#[test]
fn index_falls_back_to_embedded_relationship_when_lookup_fails() {
    let prvs = vec![pre_release_version("prv-7", "7.2", &["b9"])];
    let mut session = FakeSession::new();

    let index = build_short_version_index(&mut session, &prvs);

    assert_eq!(index.get("b9").map(String::as_str), Some("7.2"));
    assert_eq!(index_lookups(&session), 1);
}

#[test]
fn short_version_is_null_only_when_every_source_misses() {
    let builds = vec![
        build_resource("known", "1", "2026-03-02T00:00:00Z", "VALID"),
        build_resource("orphan", "2", "2026-03-01T00:00:00Z", "VALID"),
    ];
    let prvs = vec![
        pre_release_version("prv-1", "5.0", &["known"]),
        json!({"type": "preReleaseVersions", "id": "prv-2", "attributes": {}}),
    ];
    let mut session = FakeSession::new();

    let records = normalize_builds(&mut session, builds, &prvs, 5);

    assert_eq!(records[0].id, "known");
    assert_eq!(records[0].short_version.as_deref(), Some("5.0"));
    assert_eq!(records[1].id, "orphan");
    assert_eq!(records[1].short_version, None);
}

#[test]
fn external_build_state_comes_from_beta_detail() {
    let mut build = build_resource("b1", "1", "2026-03-01T00:00:00Z", "VALID");
    build["relationships"]["buildBetaDetail"] = json!({
        "data": {"type": "buildBetaDetails", "id": "d1", "attributes": {"externalBuildState": "READY_FOR_BETA_TESTING"}}
    });
    let mut session = FakeSession::new();

    let records = normalize_builds(&mut session, vec![build], &[], 1);

    assert_eq!(
        records[0].external_build_state.as_deref(),
        Some("READY_FOR_BETA_TESTING")
    );
    assert_eq!(records[0].version, "1");
}
