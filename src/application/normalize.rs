//! Flattening of entry query payloads.
//!
//! Depending on the client and API a query comes back as `[entry, ..]`,
//! `[[entry, ..], count]` or `{"entries": [entry, ..]}`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

/// First non-empty entry object of a query payload.
pub fn first_entry(payload: &Value) -> Option<&Map<String, Value>> {
    entry_slice(payload)?
        .iter()
        .filter_map(Value::as_object)
        .find(|entry| !entry.is_empty())
}

/// All entry objects of a query payload, empty for unknown shapes.
pub fn entry_list(payload: &Value) -> Vec<&Map<String, Value>> {
    entry_slice(payload)
        .map(|entries| entries.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

fn entry_slice(payload: &Value) -> Option<&[Value]> {
    match payload {
        Value::Array(items) => match items.first() {
            Some(Value::Array(nested)) => Some(nested.as_slice()),
            _ => Some(items.as_slice()),
        },
        Value::Object(map) => map.get("entries")?.as_array().map(Vec::as_slice),
        _ => None,
    }
}

pub fn decode_first<T: DeserializeOwned>(payload: &Value) -> Result<Option<T>, serde_json::Error> {
    first_entry(payload)
        .map(|entry| serde_json::from_value(Value::Object(entry.clone())))
        .transpose()
}

/// Decodes every entry, dropping the ones that do not fit `T`.
pub fn decode_list<T: DeserializeOwned>(payload: &Value) -> Vec<T> {
    entry_list(payload)
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(Value::Object(entry.clone())) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(
                    target = "application::normalize::decode_list",
                    error = %err,
                    "skipping entry that failed to decode"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_known_shapes_yield_the_same_entry() {
        let expected = json!({"title": "X"});
        for payload in [
            json!([{"title": "X"}]),
            json!([[{"title": "X"}]]),
            json!([[{"title": "X"}], 1]),
            json!({"entries": [{"title": "X"}]}),
        ] {
            let entry = first_entry(&payload).cloned().map(Value::Object);
            assert_eq!(entry.as_ref(), Some(&expected), "payload {payload}");
        }
    }

    #[test]
    fn unknown_shapes_yield_nothing() {
        for payload in [
            json!(null),
            json!("entries"),
            json!({"entry": {"title": "X"}}),
            json!({"entries": "X"}),
            json!([]),
            json!([[]]),
        ] {
            assert!(first_entry(&payload).is_none(), "payload {payload}");
            assert!(entry_list(&payload).is_empty(), "payload {payload}");
        }
    }

    #[test]
    fn empty_objects_are_skipped_for_first_entry() {
        let payload = json!([{}, {"title": "Y"}]);
        assert_eq!(
            first_entry(&payload).and_then(|entry| entry.get("title")),
            Some(&json!("Y"))
        );
    }

    #[test]
    fn list_keeps_order() {
        let payload = json!({"entries": [{"title": "A"}, {"title": "B"}]});
        let titles: Vec<_> = entry_list(&payload)
            .into_iter()
            .filter_map(|entry| entry.get("title").and_then(Value::as_str))
            .collect();
        assert_eq!(titles, ["A", "B"]);
    }
}
