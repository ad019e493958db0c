//! Error types for the marketplace API client

use crate::response::ResponseBody;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the marketplace API
#[derive(Clone, Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, body read)
    #[error("Request failed: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("{message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message taken from the body, or `"<status> <reason>"`
        message: String,
        /// Decoded response body
        body: ResponseBody,
    },

    /// The transport failed while a streamed body was being read
    #[error("Stream failed: {0}")]
    Stream(String),

    /// The response body did not have the expected shape
    #[error("Response decoding failed: {0}")]
    Decode(String),

    /// The request body could not be serialized
    #[error("Request serialization failed: {0}")]
    Serialization(String),

    /// The caller's cancellation token fired
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Build an [`ApiError::Http`] for a non-success response.
    ///
    /// The message prefers a `detail` field of a structured body, then a
    /// `message` field; non-string values are rendered as JSON text. Without
    /// either, the message is `"<status> <reason>"`.
    #[must_use]
    pub fn http(status: u16, reason: Option<&str>, body: ResponseBody) -> Self {
        let message = body.error_message().unwrap_or_else(|| match reason {
            Some(reason) if !reason.is_empty() => format!("{status} {reason}"),
            _ => status.to_string(),
        });
        Self::Http { status, message, body }
    }

    /// HTTP status, for [`ApiError::Http`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is [`ApiError::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub(crate) fn render_field(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_wins_over_message() {
        let err = ApiError::http(
            422,
            Some("Unprocessable Entity"),
            ResponseBody::Structured(json!({ "detail": "bad id", "message": "ignored" })),
        );
        assert_eq!(err.to_string(), "bad id");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn test_non_string_detail_is_rendered_as_json() {
        let err = ApiError::http(
            422,
            None,
            ResponseBody::Structured(json!({ "detail": [{ "loc": ["body"] }] })),
        );
        assert_eq!(err.to_string(), r#"[{"loc":["body"]}]"#);
    }

    #[test]
    fn test_reason_phrase_fallback() {
        let err = ApiError::http(503, Some("Service Unavailable"), ResponseBody::Empty);
        assert_eq!(err.to_string(), "503 Service Unavailable");

        let err = ApiError::http(599, None, ResponseBody::Text("oops".into()));
        assert_eq!(err.to_string(), "599");
    }
}
