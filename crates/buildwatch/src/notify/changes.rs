use std::collections::{HashMap, HashSet};

use crate::models::{AppRecord, BuildRecord, Report};

/// One build whose state differs from the previous report (or is new).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusChange<'a> {
    pub app: &'a AppRecord,
    pub build: &'a BuildRecord,
    pub previous: Option<&'a BuildRecord>,
}

/// Compares `current` against `previous`, keyed by app id and build id.
///
/// Without a previous report every build counts as changed. A build listed
/// more than once (the same app under several teams) yields one event.
#[must_use]
pub fn detect_status_changes<'a>(
    previous: Option<&'a Report>,
    current: &'a Report,
) -> Vec<StatusChange<'a>> {
    let known: Option<HashMap<(&str, &str), &BuildRecord>> = previous.map(|report| {
        report
            .iter()
            .flat_map(|app| {
                app.builds
                    .iter()
                    .map(move |build| ((app.app_id.as_str(), build.id.as_str()), build))
            })
            .collect()
    });

    let mut seen = HashSet::new();
    let mut changes = Vec::new();
    for app in current {
        for build in &app.builds {
            if !seen.insert((app.app_id.as_str(), build.id.as_str())) {
                continue;
            }
            let earlier = known
                .as_ref()
                .and_then(|index| index.get(&(app.app_id.as_str(), build.id.as_str())))
                .copied();
            let changed = match (&known, earlier) {
                (None, _) | (Some(_), None) => true,
                (Some(_), Some(before)) => {
                    before.status != build.status
                        || before.beta_review_state != build.beta_review_state
                }
            };
            if changed {
                changes.push(StatusChange {
                    app,
                    build,
                    previous: earlier,
                });
            }
        }
    }
    changes
}

#[must_use]
pub fn status_change_message(app: &AppRecord, build: &BuildRecord) -> String {
    format!(
        "The status of build version *{}* for your app *{}* has been changed to *{}*",
        build.version, app.name, build.status
    )
}

#[cfg(test)]
mod tests {
    use super::{detect_status_changes, status_change_message};
    use crate::models::{AppRecord, BuildRecord, StatusValue};

    fn build(id: &str, status: &str, review: Option<&str>) -> BuildRecord {
        BuildRecord {
            id: id.to_string(),
            version: format!("{id}-number"),
            short_version: Some("1.0".to_string()),
            uploaded_at: None,
            status: status.to_string(),
            beta_review_state: review.map(str::to_string),
            external_build_state: None,
        }
    }

    fn app(builds: Vec<BuildRecord>) -> AppRecord {
        AppRecord {
            name: "Sample".to_string(),
            version: "1.0".to_string(),
            status: StatusValue::text("READY_FOR_SALE"),
            app_id: "app-1".to_string(),
            icon_url: None,
            builds,
        }
    }

    #[test]
    fn every_build_is_a_change_without_previous_report() {
        let current = vec![app(vec![build("b1", "VALID", None), build("b2", "PROCESSING", None)])];
        let changes = detect_status_changes(None, &current);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|change| change.previous.is_none()));
    }

    #[test]
    fn reports_new_builds_and_state_transitions_only() {
        let previous = vec![app(vec![
            build("b1", "PROCESSING", None),
            build("b2", "VALID", Some("WAITING_FOR_REVIEW")),
            build("b3", "VALID", None),
        ])];
        let current = vec![app(vec![
            build("b1", "VALID", None),
            build("b2", "VALID", Some("APPROVED")),
            build("b3", "VALID", None),
            build("b4", "PROCESSING", None),
        ])];

        let changed: Vec<_> = detect_status_changes(Some(&previous), &current)
            .iter()
            .map(|change| change.build.id.clone())
            .collect();
        assert_eq!(changed, vec!["b1", "b2", "b4"]);
    }

    #[test]
    fn repeated_app_across_teams_yields_one_event_per_build() {
        let current = vec![
            app(vec![build("b1", "VALID", None)]),
            app(vec![build("b1", "VALID", None)]),
        ];

        assert_eq!(detect_status_changes(None, &current).len(), 1);

        let previous = vec![app(vec![build("b1", "PROCESSING", None)])];
        let changes = detect_status_changes(Some(&previous), &current);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].previous.map(|before| before.status.as_str()),
            Some("PROCESSING")
        );
    }

    #[test]
    fn message_names_build_app_and_status() {
        let record = app(Vec::new());
        let message = status_change_message(&record, &build("b9", "VALID", None));
        assert_eq!(
            message,
            "The status of build version *b9-number* for your app *Sample* has been changed to *VALID*"
        );
    }
}
