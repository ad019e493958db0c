//! Endpoint request description

use crate::error::ApiError;
pub use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Content type applied to JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Request body.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON-encoded value (sets `content-type: application/json`)
    Json(Value),
    /// Raw bytes passed through untouched
    Raw {
        /// Payload
        bytes: Vec<u8>,
        /// Caller-supplied content type
        content_type: String,
    },
}

/// A request to one marketplace endpoint, relative to the configured base.
///
/// ```
/// use artisan_studio_http::EndpointRequest;
///
/// let request = EndpointRequest::get("/v1/products/")
///     .with_query("limit", "24")
///     .with_query("limit", "12");
/// assert_eq!(request.query(), &[("limit".to_string(), "12".to_string())]);
/// ```
#[derive(Clone, Debug)]
pub struct EndpointRequest {
    path: String,
    method: Method,
    query: Vec<(String, String)>,
    body: RequestBody,
    headers: Vec<(String, String)>,
    cancellation: Option<CancellationToken>,
}

impl EndpointRequest {
    /// Create a request with an explicit method.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: Vec::new(),
            cancellation: None,
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `PUT` request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Set a query parameter. Setting an existing key replaces its value in place.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key, value)),
        }
        self
    }

    /// Serialize `body` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Serialization`] if `body` cannot be encoded.
    pub fn with_json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.with_json_value(value))
    }

    /// Use an already-built JSON value as the body.
    #[must_use]
    pub fn with_json_value(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    /// Use raw bytes as the body.
    #[must_use]
    pub fn with_raw(mut self, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Raw {
            bytes,
            content_type: content_type.into(),
        };
        self
    }

    /// Add a header. Caller headers override the JSON content type.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Race the call against `token`.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Relative path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTP method
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Query parameters in insertion order
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Body
    #[must_use]
    pub const fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Extra headers
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Cancellation token, if any
    #[must_use]
    pub const fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }
}

/// Percent-encode one path segment (ids, slugs).
#[must_use]
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_json_sets_body() {
        let request = EndpointRequest::patch("/v1/products/a")
            .with_json(&json!({ "is_active": false }))
            .unwrap();
        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(request.body(), &RequestBody::Json(json!({ "is_active": false })));
    }

    #[test]
    fn test_query_keeps_insertion_order() {
        let request = EndpointRequest::get("/x")
            .with_query("a", "1")
            .with_query("b", "2")
            .with_query("a", "3");
        assert_eq!(
            request.query(),
            &[("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("a b/c"), "a%20b%2Fc");
    }
}
