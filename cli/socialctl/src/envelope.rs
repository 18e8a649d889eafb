//! Response normalization.
//!
//! The platforms wrap their content in a handful of envelope shapes. Every
//! read action names the shape it expects and [`normalize`] applies the
//! matching unwrap rule. A payload that does not fit the named shape is a
//! [`CliError::MalformedResponse`], never an empty result; a `null` payload
//! (empty body or 204) is an empty result for list shapes.

use serde_json::Value;
use tracing::debug;

use crate::client::Response;
use crate::error::CliError;
use crate::platform::Platform;
use crate::record::DomainRecord;

/// Longest slice of an unexpected payload quoted in the error.
const PAYLOAD_SNIPPET_CHARS: usize = 120;

/// Which half of a two-element comment tree to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPart {
    Root,
    Replies,
}

/// Envelope shapes the platforms use around content records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `[{...}, ...]`
    Array,

    /// `{data: {children: [{kind, data}]}}`, keeping only `kind` when set.
    Listing { kind: Option<&'static str> },

    /// `[root_listing, reply_listing]`
    Thread {
        part: ThreadPart,
        kind: Option<&'static str>,
    },

    /// `{included: [...]}` or `{elements: [...]}` filtered on `$type`.
    ///
    /// When `text` is non-empty an entry must carry a string at one of those
    /// paths; entries without one are unloaded stubs and are skipped.
    Tagged {
        type_tag: &'static str,
        text: &'static [&'static str],
    },

    /// `{messages: [[hit, context...], ...]}`; the first entry of each group
    /// is the hit.
    SearchHits,

    /// A single object, taken from its `data` member when `wrapped` and one
    /// is present.
    Object { wrapped: bool },
}

impl Envelope {
    fn describe(self) -> &'static str {
        match self {
            Self::Array => "top-level array",
            Self::Listing { .. } => "listing",
            Self::Thread { .. } => "comment tree",
            Self::Tagged { .. } => "tagged element collection",
            Self::SearchHits => "search result set",
            Self::Object { .. } => "single object",
        }
    }
}

/// Normalized records, in payload order.
///
/// Single pass: the page is already in memory, so this simply drains it.
#[derive(Debug)]
pub struct Records {
    inner: std::vec::IntoIter<DomainRecord>,
}

impl Records {
    fn new(records: Vec<DomainRecord>) -> Self {
        Self {
            inner: records.into_iter(),
        }
    }
}

impl Iterator for Records {
    type Item = DomainRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Records {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl ExactSizeIterator for Records {}

/// Unwrap `raw` according to `envelope`.
pub fn normalize(platform: Platform, envelope: Envelope, raw: Value) -> Result<Records, CliError> {
    let malformed = |raw: &Value| {
        let text = raw.to_string();
        let cut = crate::record::truncate(&text, PAYLOAD_SNIPPET_CHARS).to_string();
        CliError::malformed(platform, envelope.describe(), cut)
    };

    let records = match envelope {
        Envelope::Object { wrapped } => {
            let value = match raw {
                Value::Object(mut map) if wrapped && map.get("data").is_some_and(Value::is_object) => {
                    map.remove("data").unwrap_or_default()
                }
                other => other,
            };
            let record = DomainRecord::from_value(value.clone()).ok_or_else(|| malformed(&value))?;
            vec![record]
        }
        _ if raw.is_null() => Vec::new(),
        Envelope::Array => match raw {
            Value::Array(items) => objects(items),
            other => return Err(malformed(&other)),
        },
        Envelope::Listing { kind } => listing(&raw, kind).ok_or_else(|| malformed(&raw))?,
        Envelope::Thread { part, kind } => {
            let index = match part {
                ThreadPart::Root => 0,
                ThreadPart::Replies => 1,
            };
            raw.as_array()
                .and_then(|parts| parts.get(index))
                .and_then(|listing_value| listing(listing_value, kind))
                .ok_or_else(|| malformed(&raw))?
        }
        Envelope::Tagged { type_tag, text } => {
            let entries = raw
                .get("included")
                .and_then(Value::as_array)
                .or_else(|| raw.get("elements").and_then(Value::as_array))
                .ok_or_else(|| malformed(&raw))?;
            entries
                .iter()
                .filter(|entry| entry.get("$type").and_then(Value::as_str) == Some(type_tag))
                .filter_map(|entry| DomainRecord::from_value(entry.clone()))
                .filter(|record| text.is_empty() || record.first_str(text).is_some())
                .collect()
        }
        Envelope::SearchHits => {
            let groups = raw
                .get("messages")
                .and_then(Value::as_array)
                .ok_or_else(|| malformed(&raw))?;
            groups
                .iter()
                .filter_map(|group| match group {
                    Value::Array(hits) => hits.first(),
                    hit => Some(hit),
                })
                .filter_map(|hit| DomainRecord::from_value(hit.clone()))
                .collect()
        }
    };

    debug!(%platform, shape = envelope.describe(), count = records.len(), "Normalized response");
    Ok(Records::new(records))
}

/// Unwrap `{data: {children: [...]}}`.
fn listing(raw: &Value, kind: Option<&str>) -> Option<Vec<DomainRecord>> {
    let children = raw.get("data")?.get("children")?.as_array()?;
    Some(
        children
            .iter()
            .filter(|child| kind.is_none() || child.get("kind").and_then(Value::as_str) == kind)
            .filter_map(|child| child.get("data"))
            .filter_map(|data| DomainRecord::from_value(data.clone()))
            .collect(),
    )
}

fn objects(items: Vec<Value>) -> Vec<DomainRecord> {
    items.into_iter().filter_map(DomainRecord::from_value).collect()
}

/// Body of a write that answers 2xx, failing when it reports errors under
/// `json.errors`.
pub fn check_embedded_errors(platform: Platform, response: Response) -> Result<Value, CliError> {
    let status = response.status;
    let body = response.into_json();
    match body.pointer("/json/errors").and_then(Value::as_array) {
        Some(errors) if !errors.is_empty() => {
            Err(CliError::api(platform, status, Value::from(errors.clone()).to_string()))
        }
        _ => Ok(body),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::Payload;

    fn ids(records: Records) -> Vec<String> {
        records
            .map(|record| record.id().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn array_keeps_fields_and_order() {
        let raw = json!([{ "id": "1", "score": 5 }, { "id": "2", "score": -3 }]);
        let records: Vec<_> = normalize(Platform::Reddit, Envelope::Array, raw)
            .unwrap()
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), Some("1"));
        assert_eq!(records[0].i64("score"), Some(5));
        assert_eq!(records[1].id(), Some("2"));
        assert_eq!(records[1].i64("score"), Some(-3));
    }

    #[test]
    fn array_envelope_rejects_objects() {
        let raw = json!({ "message": "401: Unauthorized", "code": 0 });
        let err = normalize(Platform::Discord, Envelope::Array, raw).unwrap_err();
        assert!(matches!(
            err,
            CliError::MalformedResponse {
                expected: "top-level array",
                ..
            }
        ));
    }

    #[test]
    fn null_payload_is_an_empty_listing() {
        let records = normalize(Platform::Reddit, Envelope::Listing { kind: None }, Value::Null).unwrap();
        assert_eq!(records.len(), 0);
    }

    #[test]
    fn listing_filters_on_kind() {
        let raw = json!({
            "kind": "Listing",
            "data": { "children": [
                { "kind": "t1", "data": { "id": "c1" } },
                { "kind": "more", "data": { "id": "m", "children": ["x"] } },
                { "kind": "t1", "data": { "id": "c2" } }
            ]}
        });
        let records = normalize(Platform::Reddit, Envelope::Listing { kind: Some("t1") }, raw).unwrap();
        assert_eq!(ids(records), vec!["c1", "c2"]);
    }

    #[test]
    fn empty_listing_is_not_malformed() {
        let raw = json!({ "data": { "children": [] } });
        let records = normalize(Platform::Reddit, Envelope::Listing { kind: None }, raw).unwrap();
        assert_eq!(records.len(), 0);
    }

    #[test]
    fn listing_without_children_is_malformed() {
        let raw = json!({ "data": { "after": null } });
        assert!(normalize(Platform::Reddit, Envelope::Listing { kind: None }, raw).is_err());
    }

    #[test]
    fn thread_parts_are_read_separately() {
        let raw = json!([
            { "data": { "children": [{ "kind": "t3", "data": { "id": "post" } }] } },
            { "data": { "children": [
                { "kind": "t1", "data": { "id": "reply" } },
                { "kind": "more", "data": { "id": "more" } }
            ]}}
        ]);

        let root = normalize(
            Platform::Reddit,
            Envelope::Thread {
                part: ThreadPart::Root,
                kind: None,
            },
            raw.clone(),
        )
        .unwrap();
        let replies = normalize(
            Platform::Reddit,
            Envelope::Thread {
                part: ThreadPart::Replies,
                kind: Some("t1"),
            },
            raw,
        )
        .unwrap();

        assert_eq!(ids(root), vec!["post"]);
        assert_eq!(ids(replies), vec!["reply"]);
    }

    #[test]
    fn thread_with_one_part_has_no_replies_shape() {
        let raw = json!([{ "data": { "children": [] } }]);
        let result = normalize(
            Platform::Reddit,
            Envelope::Thread {
                part: ThreadPart::Replies,
                kind: None,
            },
            raw,
        );
        assert!(result.is_err());
    }

    #[test]
    fn tagged_filters_type_and_skips_stubs() {
        const TEXT: &[&str] = &["commentary.text.text"];
        let raw = json!({
            "data": {},
            "included": [
                { "$type": "com.example.Update", "urn": "u1", "commentary": { "text": { "text": "hello" } } },
                { "$type": "com.example.Update", "urn": "u2" },
                { "$type": "com.example.Profile", "urn": "p1" }
            ]
        });
        let records = normalize(
            Platform::LinkedIn,
            Envelope::Tagged {
                type_tag: "com.example.Update",
                text: TEXT,
            },
            raw,
        )
        .unwrap();
        assert_eq!(ids(records), vec!["u1"]);
    }

    #[test]
    fn tagged_falls_back_to_elements() {
        let raw = json!({ "elements": [{ "$type": "T", "id": "e1" }] });
        let records = normalize(
            Platform::LinkedIn,
            Envelope::Tagged {
                type_tag: "T",
                text: &[],
            },
            raw,
        )
        .unwrap();
        assert_eq!(ids(records), vec!["e1"]);
    }

    #[test]
    fn search_hits_take_first_of_each_group() {
        let raw = json!({
            "total_results": 2,
            "messages": [
                [{ "id": "h1" }, { "id": "ctx" }],
                [{ "id": "h2" }]
            ]
        });
        let records = normalize(Platform::Discord, Envelope::SearchHits, raw).unwrap();
        assert_eq!(ids(records), vec!["h1", "h2"]);
    }

    #[test]
    fn object_unwraps_data_when_wrapped() {
        let raw = json!({ "kind": "t2", "data": { "id": "u1", "name": "spez" } });
        let mut records = normalize(Platform::Reddit, Envelope::Object { wrapped: true }, raw).unwrap();
        assert_eq!(records.next().and_then(|r| r.str("name").map(String::from)), Some("spez".to_string()));
    }

    #[test]
    fn object_without_wrapper_is_used_directly() {
        let raw = json!({ "id": "u1", "data": "not-an-object" });
        let mut records = normalize(Platform::LinkedIn, Envelope::Object { wrapped: true }, raw).unwrap();
        assert_eq!(records.next().and_then(|r| r.id().map(String::from)), Some("u1".to_string()));
    }

    #[test]
    fn null_object_is_malformed() {
        assert!(normalize(Platform::Discord, Envelope::Object { wrapped: false }, Value::Null).is_err());
    }

    #[test]
    fn embedded_errors_fail_a_successful_write() {
        let response = Response {
            status: 200,
            payload: Payload::Json(json!({ "json": { "errors": [["RATELIMIT", "slow down", "ratelimit"]] } })),
        };
        let err = check_embedded_errors(Platform::Reddit, response).unwrap_err();
        match err {
            CliError::Api { status, body, .. } => {
                assert_eq!(status, 200);
                assert!(body.contains("RATELIMIT"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_error_list_passes_the_body_through() {
        let body = json!({ "json": { "errors": [], "data": { "url": "https://reddit.com/x" } } });
        let response = Response {
            status: 200,
            payload: Payload::Json(body.clone()),
        };
        assert_eq!(check_embedded_errors(Platform::Reddit, response).unwrap(), body);
    }

    #[test]
    fn records_reverse_for_oldest_first() {
        let raw = json!([{ "id": "3" }, { "id": "2" }, { "id": "1" }]);
        let records = normalize(Platform::Discord, Envelope::Array, raw).unwrap();
        let ordered: Vec<_> = records.rev().map(|r| r.id().unwrap().to_string()).collect();
        assert_eq!(ordered, vec!["1", "2", "3"]);
    }
}
