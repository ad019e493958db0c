//! Decoded response bodies

use crate::error::{ApiError, render_field};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A response body decoded according to its declared content type.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    /// Declared JSON and parsed successfully
    Structured(Value),
    /// Anything else, decoded as (lossy) UTF-8
    Text(String),
    /// Zero-length body
    Empty,
}

impl ResponseBody {
    /// Decode `bytes` using the `content-type` header value.
    ///
    /// JSON is only attempted when the content type contains
    /// `application/json`; a declared-JSON body that fails to parse is kept
    /// as text.
    #[must_use]
    pub fn decode(content_type: Option<&str>, bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::Empty;
        }

        let declared_json = content_type
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
        if declared_json {
            if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
                return Self::Structured(value);
            }
        }

        Self::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Message for an error response: `detail`, then `message`.
    ///
    /// Null, `false` and blank strings do not count as a message.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        let Self::Structured(value) = self else {
            return None;
        };
        ["detail", "message"]
            .into_iter()
            .filter_map(|key| value.get(key))
            .find(|v| match v {
                Value::Null | Value::Bool(false) => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
            .map(render_field)
    }

    /// Whether the body was empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// What kind of content a response carried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
    /// JSON
    Structured,
    /// Text
    Text,
    /// No body
    None,
}

/// A successful response.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointResponse {
    /// HTTP status code
    pub status: u16,
    /// Decoded body
    pub body: ResponseBody,
}

impl EndpointResponse {
    /// Kind of content carried.
    #[must_use]
    pub const fn content_kind(&self) -> ContentKind {
        match self.body {
            ResponseBody::Structured(_) => ContentKind::Structured,
            ResponseBody::Text(_) => ContentKind::Text,
            ResponseBody::Empty => ContentKind::None,
        }
    }

    /// Deserialize the structured body into `T`.
    ///
    /// An empty body deserializes from `null`, so `Option<_>` and
    /// all-defaulted structs accept it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] for text bodies or a shape mismatch.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        match &self.body {
            ResponseBody::Structured(value) => Ok(T::deserialize(value)?),
            ResponseBody::Empty => Ok(T::deserialize(Value::Null)?),
            ResponseBody::Text(text) => Err(ApiError::Decode(format!(
                "expected JSON body, got text ({} bytes)",
                text.len()
            ))),
        }
    }

    /// Consume the response, returning the structured value (`Null` otherwise).
    #[must_use]
    pub fn into_value(self) -> Value {
        match self.body {
            ResponseBody::Structured(value) => value,
            ResponseBody::Text(_) | ResponseBody::Empty => Value::Null,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_json_that_fails_to_parse_is_text() {
        let body = ResponseBody::decode(Some("application/json; charset=utf-8"), b"{not json");
        assert_eq!(body, ResponseBody::Text("{not json".into()));
    }

    #[test]
    fn test_json_without_declaration_is_text() {
        let body = ResponseBody::decode(Some("text/plain"), br#"{"a":1}"#);
        assert_eq!(body, ResponseBody::Text(r#"{"a":1}"#.into()));
    }

    #[test]
    fn test_blank_detail_is_not_a_message() {
        let body = ResponseBody::Structured(json!({ "detail": "", "message": "real" }));
        assert_eq!(body.error_message().as_deref(), Some("real"));

        let body = ResponseBody::Structured(json!({ "detail": "  ", "message": null }));
        assert_eq!(body.error_message(), None);

        let err = ApiError::http(
            500,
            Some("Internal Server Error"),
            ResponseBody::Structured(json!({ "detail": "" })),
        );
        assert_eq!(err.to_string(), "500 Internal Server Error");
    }

    #[test]
    fn test_empty_body() {
        assert!(ResponseBody::decode(Some("application/json"), b"").is_empty());
    }

    #[test]
    fn test_json_accessor() {
        let response = EndpointResponse {
            status: 200,
            body: ResponseBody::Structured(json!({ "a": 1 })),
        };
        let value: Value = response.json().unwrap();
        assert_eq!(value["a"], 1);
        assert_eq!(response.content_kind(), ContentKind::Structured);

        let empty = EndpointResponse { status: 204, body: ResponseBody::Empty };
        let none: Option<Value> = empty.json().unwrap();
        assert!(none.is_none());

        let text = EndpointResponse { status: 200, body: ResponseBody::Text("hi".into()) };
        assert!(matches!(text.json::<Value>(), Err(ApiError::Decode(_))));
    }
}
