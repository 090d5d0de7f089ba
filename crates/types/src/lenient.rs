//! Forgiving deserializers for workflow payload fields.
//!
//! The platform API is not strict about scalar encodings: identifiers show up
//! as numbers, durations as numeric strings, and an unfinished workflow may
//! report its `result` as `null`, `""`, or `false`. These helpers normalize
//! those shapes so a single odd field never prevents a status poll from being
//! interpreted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a string or number identifier.
pub(crate) fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number identifier, found {other}"))),
    }
}

/// Accepts a string or number identifier, treating `null` as absent.
pub(crate) fn optional_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(serde::de::Error::custom(format!("expected string or number identifier, found {other}"))),
    }
}

/// Interprets a terminal-result marker.
///
/// `null`, blank strings and `false` all mean "not finished yet".
pub(crate) fn optional_result<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// Accepts seconds as a JSON number or a numeric string.
pub(crate) fn optional_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Accepts free text, stringifying scalars and treating `null` as absent.
pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// Decodes an object-shaped field. Strings, arrays, booleans and objects that
/// do not fit `T` are treated as absent.
pub(crate) fn optional_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Renders an arbitrary JSON payload as readable text.
///
/// Strings are returned verbatim; every other shape is pretty-printed so that
/// nested error structures remain legible.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "optional_result")]
        result: Option<String>,
        #[serde(default, deserialize_with = "optional_seconds")]
        seconds: Option<f64>,
    }

    fn probe(value: Value) -> Probe {
        serde_json::from_value(value).expect("probe decodes")
    }

    #[test]
    fn unfinished_result_markers_are_absent() {
        assert_eq!(probe(json!({ "result": null })).result, None);
        assert_eq!(probe(json!({ "result": "" })).result, None);
        assert_eq!(probe(json!({ "result": "  " })).result, None);
        assert_eq!(probe(json!({ "result": false })).result, None);
        assert_eq!(probe(json!({})).result, None);
    }

    #[test]
    fn non_string_results_are_kept_as_text() {
        assert_eq!(probe(json!({ "result": "aborted" })).result.as_deref(), Some("aborted"));
        assert_eq!(probe(json!({ "result": 1 })).result.as_deref(), Some("1"));
    }

    #[test]
    fn seconds_accept_numbers_and_numeric_strings() {
        assert_eq!(probe(json!({ "seconds": 12.5 })).seconds, Some(12.5));
        assert_eq!(probe(json!({ "seconds": "42" })).seconds, Some(42.0));
        assert_eq!(probe(json!({ "seconds": "soon" })).seconds, None);
        assert_eq!(probe(json!({ "seconds": null })).seconds, None);
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Named {
        name: String,
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "optional_object")]
        named: Option<Named>,
    }

    fn named(value: Value) -> Option<Named> {
        serde_json::from_value::<Holder>(value).expect("holder decodes").named
    }

    #[test]
    fn non_object_fields_are_absent() {
        assert_eq!(named(json!({ "named": { "name": "a" } })), Some(Named { name: "a".into() }));
        assert_eq!(named(json!({ "named": "system" })), None);
        assert_eq!(named(json!({ "named": [] })), None);
        assert_eq!(named(json!({ "named": false })), None);
        assert_eq!(named(json!({ "named": { "other": 1 } })), None);
        assert_eq!(named(json!({})), None);
    }

    #[test]
    fn nested_payloads_render_as_pretty_json() {
        let text = value_to_text(&json!({ "code": 507, "detail": "disk full" }));
        assert!(text.contains("\"detail\": \"disk full\""));
        assert_eq!(value_to_text(&json!("plain")), "plain");
    }
}
