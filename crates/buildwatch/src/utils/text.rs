use serde_json::Value;

/// Non-empty, trimmed string at a JSON pointer inside `object`.
#[must_use]
pub fn string_at(object: &Value, pointer: &str) -> Option<String> {
    extract_string(object.pointer(pointer))
}

#[must_use]
pub fn extract_string(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Splits a comma-separated configuration list, dropping blank entries.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
