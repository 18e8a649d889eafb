//! Loosely-typed platform records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier fields, in the order they are tried.
const ID_FIELDS: [&str; 3] = ["id", "entityUrn", "urn"];

/// One unit of platform content (message, post, profile, community).
///
/// Only the identifier is expected to be present; everything else is read
/// through accessors that tolerate absence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainRecord(Map<String, Value>);

impl DomainRecord {
    /// Wrap a JSON object. Anything else is not a record.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Look up a dotted path such as `author.username`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        parts.try_fold(self.0.get(first)?, |value, key| value.get(key))
    }

    /// Non-empty string at `path`.
    pub fn str(&self, path: &str) -> Option<&str> {
        self.get(path)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// First non-empty string among `paths`.
    pub fn first_str(&self, paths: &[&str]) -> Option<&str> {
        paths.iter().find_map(|path| self.str(path))
    }

    /// String or number at `path` rendered as text, blank when absent.
    pub fn text(&self, path: &str) -> String {
        match self.get(path) {
            Some(Value::String(value)) => value.clone(),
            Some(Value::Number(value)) => value.to_string(),
            Some(Value::Bool(value)) => value.to_string(),
            _ => String::new(),
        }
    }

    pub fn i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }

    pub fn f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    /// `true` only for a literal JSON `true`.
    pub fn flag(&self, path: &str) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Number of elements in the array at `path`, zero when absent.
    pub fn len_of(&self, path: &str) -> usize {
        self.get(path)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Stable identifier of the record.
    pub fn id(&self) -> Option<&str> {
        ID_FIELDS.iter().find_map(|field| self.str(field))
    }
}

/// Cut `text` to at most `width` characters for display.
pub fn truncate(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> DomainRecord {
        DomainRecord::from_value(value).unwrap()
    }

    #[test]
    fn non_objects_are_not_records() {
        assert!(DomainRecord::from_value(json!([1, 2])).is_none());
        assert!(DomainRecord::from_value(Value::Null).is_none());
    }

    #[test]
    fn dotted_paths_walk_nested_objects() {
        let r = record(json!({ "author": { "username": "ana" }, "score": 5 }));
        assert_eq!(r.str("author.username"), Some("ana"));
        assert_eq!(r.i64("score"), Some(5));
        assert_eq!(r.get("author.missing"), None);
        assert_eq!(r.text("score"), "5");
        assert_eq!(r.text("nope"), "");
    }

    #[test]
    fn id_prefers_plain_id_then_urns() {
        assert_eq!(record(json!({ "id": "1", "urn": "u" })).id(), Some("1"));
        assert_eq!(record(json!({ "entityUrn": "urn:li:fs_profile:9" })).id(), Some("urn:li:fs_profile:9"));
        assert_eq!(record(json!({ "name": "x" })).id(), None);
    }

    #[test]
    fn empty_strings_are_absent() {
        let r = record(json!({ "body": "", "fallback": "text" }));
        assert_eq!(r.str("body"), None);
        assert_eq!(r.first_str(&["body", "fallback"]), Some("text"));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 10), "short");
    }
}
