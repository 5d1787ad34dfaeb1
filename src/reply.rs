//! Strict decoding of model replies
//!
//! A reply must be exactly one JSON value. Two wrappings are tolerated:
//! surrounding whitespace, and one markdown code fence (```json ... ``` or
//! ``` ... ```) enclosing the whole reply. JSON embedded in prose is not
//! searched for; such replies decode to `None`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Strip surrounding whitespace and at most one enclosing code fence.
fn unwrap_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // info string such as `json` runs up to the first newline
    match body.find('\n') {
        Some(newline) if body[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            body[newline + 1..].trim()
        }
        _ => body.trim(),
    }
}

/// Decode a reply as a single JSON value.
pub fn parse_value(text: &str) -> Option<Value> {
    serde_json::from_str(unwrap_fence(text)).ok()
}

/// Decode a reply that must be one JSON object.
pub fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match parse_value(text)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Decode a reply that must be one JSON array.
pub fn parse_array(text: &str) -> Option<Vec<Value>> {
    match parse_value(text)? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// Decode a reply straight into a typed shape.
pub fn parse_as<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(unwrap_fence(text)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object_parses() {
        let obj = parse_object(r#"  {"exists": false}  "#).unwrap();
        assert_eq!(obj["exists"], Value::Bool(false));
    }

    #[test]
    fn json_fence_is_tolerated() {
        let obj = parse_object("```json\n{\"valid\": true}\n```").unwrap();
        assert_eq!(obj["valid"], Value::Bool(true));
    }

    #[test]
    fn plain_fence_is_tolerated() {
        let obj = parse_object("```\n{\"valid\": true}\n```").unwrap();
        assert_eq!(obj["valid"], Value::Bool(true));
    }

    #[test]
    fn single_line_fence_is_tolerated() {
        let items = parse_array("```[1, 2]```").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn prose_around_json_is_rejected() {
        assert!(parse_object(r#"Here is the edge: {"exists": false}"#).is_none());
        assert!(parse_object("```json\n{\"a\": 1}\n```\nHope this helps").is_none());
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert!(parse_object("[1, 2]").is_none());
        assert!(parse_array(r#"{"a": 1}"#).is_none());
        assert!(parse_object("").is_none());
    }

    #[test]
    fn typed_decode() {
        #[derive(serde::Deserialize)]
        struct Verdict {
            valid: bool,
        }
        let v: Verdict = parse_as("```json\n{\"valid\": true}\n```").unwrap();
        assert!(v.valid);
        assert!(parse_as::<Verdict>(r#"{"valid": "yes"}"#).is_none());
    }
}
