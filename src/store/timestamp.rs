//! Timestamp fields that also accept ISO-8601 without an offset
//!
//! Files written elsewhere may carry `2025-03-01T12:30:45.123456`; such
//! values are read as UTC. Writing always uses RFC 3339.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse RFC 3339, falling back to a naive date-time taken as UTC.
pub(crate) fn parse_lenient(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, NAIVE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn from_text<E: serde::de::Error>(text: &str) -> Result<DateTime<Utc>, E> {
    parse_lenient(text).ok_or_else(|| E::custom(format!("invalid timestamp: {text}")))
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    from_text(&text)
}

pub(crate) fn deserialize_option<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| from_text(&text))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn rfc3339_with_offset_is_normalized() {
        let stamp = parse_lenient("2025-03-01T14:30:45+02:00").unwrap();
        assert_eq!(stamp.hour(), 12);
    }

    #[test]
    fn naive_value_is_read_as_utc() {
        let stamp = parse_lenient("2025-03-01T12:30:45.123456").unwrap();
        assert_eq!(stamp.day(), 1);
        assert_eq!(stamp.hour(), 12);
        assert_eq!(stamp.nanosecond(), 123_456_000);

        assert!(parse_lenient("2025-03-01T12:30:45").is_some());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_lenient("yesterday").is_none());
        let err = serde_json::from_str::<Wrapper>(r#"{"at": "yesterday"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn null_optional_field_stays_none() {
        let wrapped: OptionalWrapper = serde_json::from_str(r#"{"at": null}"#).unwrap();
        assert!(wrapped.at.is_none());
        let wrapped: OptionalWrapper = serde_json::from_str("{}").unwrap();
        assert!(wrapped.at.is_none());
    }

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "super::deserialize")]
        #[allow(dead_code)]
        at: DateTime<Utc>,
    }

    #[derive(Debug, Deserialize)]
    struct OptionalWrapper {
        #[serde(default, deserialize_with = "super::deserialize_option")]
        at: Option<DateTime<Utc>>,
    }
}
