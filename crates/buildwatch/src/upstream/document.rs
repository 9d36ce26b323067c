//! JSON:API document handling for App Store Connect responses.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub data: Value,

    #[serde(default)]
    pub included: Vec<Value>,

    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub next: Option<String>,
}

impl Document {
    /// Appends the resources of a follow-up page and adopts its `next` link.
    pub fn absorb_page(&mut self, page: Document) {
        let mut resources = std::mem::take(&mut self.data).into_resources();
        resources.extend(page.data.into_resources());
        self.data = Value::Array(resources);
        self.included.extend(page.included);
        self.links = page.links;
    }

    /// Primary resources with every relationship identifier that has a
    /// matching `included` resource replaced by that resource.
    #[must_use]
    pub fn into_hydrated(self) -> Vec<Value> {
        let index = included_index(&self.included);
        self.data
            .into_resources()
            .into_iter()
            .map(|resource| hydrate_resource(resource, &index))
            .collect()
    }
}

trait IntoResources {
    fn into_resources(self) -> Vec<Value>;
}

impl IntoResources for Value {
    fn into_resources(self) -> Vec<Value> {
        match self {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            single => vec![single],
        }
    }
}

#[must_use]
pub fn resource_id(resource: &Value) -> Option<&str> {
    resource.get("id").and_then(Value::as_str)
}

fn identifier_key(resource: &Value) -> Option<(String, String)> {
    let kind = resource.get("type")?.as_str()?;
    let id = resource.get("id")?.as_str()?;
    Some((kind.to_string(), id.to_string()))
}

fn included_index(included: &[Value]) -> HashMap<(String, String), Value> {
    included
        .iter()
        .filter_map(|resource| identifier_key(resource).map(|key| (key, resource.clone())))
        .collect()
}

fn hydrate_resource(mut resource: Value, index: &HashMap<(String, String), Value>) -> Value {
    let Some(relationships) = resource
        .get_mut("relationships")
        .and_then(Value::as_object_mut)
    else {
        return resource;
    };

    for relationship in relationships.values_mut() {
        let Some(data) = relationship.get_mut("data") else {
            continue;
        };
        if let Some(identifiers) = data.as_array_mut() {
            for identifier in identifiers.iter_mut() {
                hydrate_identifier(identifier, index);
            }
        } else if data.is_object() {
            hydrate_identifier(data, index);
        }
    }

    resource
}

fn hydrate_identifier(identifier: &mut Value, index: &HashMap<(String, String), Value>) {
    if let Some(full) = identifier_key(identifier).and_then(|key| index.get(&key)) {
        *identifier = full.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, resource_id};
    use serde_json::json;

    #[test]
    fn hydrates_to_one_and_to_many_relationships() {
        let document: Document = serde_json::from_value(json!({
            "data": [{
                "type": "builds",
                "id": "b-1",
                "relationships": {
                    "preReleaseVersion": {"data": {"type": "preReleaseVersions", "id": "p-1"}},
                    "betaAppReviewSubmission": {"data": null},
                    "individualTesters": {"data": [{"type": "betaTesters", "id": "t-1"}]}
                }
            }],
            "included": [
                {"type": "preReleaseVersions", "id": "p-1", "attributes": {"version": "4.0"}},
                {"type": "betaTesters", "id": "t-1", "attributes": {"email": "x"}}
            ]
        }))
        .expect("document should parse");

        let builds = document.into_hydrated();
        assert_eq!(builds.len(), 1);
        assert_eq!(
            builds[0].pointer("/relationships/preReleaseVersion/data/attributes/version"),
            Some(&json!("4.0"))
        );
        assert_eq!(
            builds[0].pointer("/relationships/individualTesters/data/0/attributes/email"),
            Some(&json!("x"))
        );
        assert_eq!(
            builds[0].pointer("/relationships/betaAppReviewSubmission/data"),
            Some(&json!(null))
        );
    }

    #[test]
    fn leaves_unmatched_identifiers_untouched() {
        let document: Document = serde_json::from_value(json!({
            "data": {
                "type": "builds",
                "id": "b-1",
                "relationships": {
                    "buildBetaDetail": {"data": {"type": "buildBetaDetails", "id": "d-9"}}
                }
            }
        }))
        .expect("document should parse");

        let builds = document.into_hydrated();
        assert_eq!(resource_id(&builds[0]), Some("b-1"));
        assert_eq!(
            builds[0].pointer("/relationships/buildBetaDetail/data"),
            Some(&json!({"type": "buildBetaDetails", "id": "d-9"}))
        );
    }

    #[test]
    fn absorbs_follow_up_pages() {
        let mut first: Document = serde_json::from_value(json!({
            "data": [{"type": "apps", "id": "1"}],
            "links": {"next": "https://example.test/page2"}
        }))
        .expect("page one should parse");
        let second: Document = serde_json::from_value(json!({
            "data": [{"type": "apps", "id": "2"}],
            "links": {"self": "https://example.test/page2"}
        }))
        .expect("page two should parse");

        first.absorb_page(second);
        assert!(first.links.next.is_none());
        let ids: Vec<_> = first
            .into_hydrated()
            .iter()
            .filter_map(|app| resource_id(app).map(str::to_string))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
