//! Stream events produced by the line-delimited response decoder.

use serde_json::Value;

/// One decoded record of a streamed response.
///
/// Records are JSON objects carrying either an incremental `delta` or a
/// complete `text`; anything else is surfaced as [`StreamEvent::Structured`].
/// Lines that are not JSON at all come through as plain text.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// Incremental fragment, appended inline by consumers
    Delta(String),
    /// Complete text segment, or a non-JSON line
    Text(String),
    /// Any other JSON value
    Structured(Value),
}

impl StreamEvent {
    /// Classify a single payload (prefix already stripped, already trimmed).
    ///
    /// A non-empty string `delta` wins over a non-empty string `text`.
    ///
    /// # Examples
    ///
    /// ```
    /// use artisan_studio_core::StreamEvent;
    ///
    /// assert_eq!(
    ///     StreamEvent::from_payload(r#"{"delta":"a","text":"b"}"#),
    ///     StreamEvent::Delta("a".into())
    /// );
    /// assert_eq!(StreamEvent::from_payload("hello"), StreamEvent::Text("hello".into()));
    /// ```
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(payload) else {
            return Self::Text(payload.to_string());
        };

        if let Some(delta) = string_field(&value, "delta") {
            return Self::Delta(delta.to_string());
        }
        if let Some(text) = string_field(&value, "text") {
            return Self::Text(text.to_string());
        }
        Self::Structured(value)
    }

    /// Text carried by the event, if it is a delta or a text segment.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Delta(text) | Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }
}

fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_delta_falls_through_to_text() {
        assert_eq!(
            StreamEvent::from_payload(r#"{"delta":"","text":"full"}"#),
            StreamEvent::Text("full".into())
        );
    }

    #[test]
    fn test_non_string_fields_are_structured() {
        assert_eq!(
            StreamEvent::from_payload(r#"{"delta":5}"#),
            StreamEvent::Structured(json!({ "delta": 5 }))
        );
        assert_eq!(
            StreamEvent::from_payload(r#"{"done":true}"#),
            StreamEvent::Structured(json!({ "done": true }))
        );
    }

    #[test]
    fn test_bare_json_scalar_is_structured() {
        assert_eq!(StreamEvent::from_payload("42"), StreamEvent::Structured(json!(42)));
    }

    #[test]
    fn test_text_accessor() {
        assert_eq!(StreamEvent::Delta("x".into()).text(), Some("x"));
        assert_eq!(StreamEvent::Structured(json!({})).text(), None);
    }
}
