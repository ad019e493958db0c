//! Marketplace API client implementation

use crate::{
    config::{ClientConfig, ConfigError},
    error::ApiError,
    request::{EndpointRequest, JSON_CONTENT_TYPE, RequestBody},
    response::{EndpointResponse, ResponseBody},
    stream::{EventStream, decode},
};
use reqwest::{Client, RequestBuilder, Response, header::CONTENT_TYPE};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Request pipeline for the marketplace API.
///
/// Stateless between calls; cloning shares the underlying connection pool.
#[derive(Clone, Debug)]
pub struct RequestClient {
    http: Client,
    base_url: String,
}

impl RequestClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the HTTP client cannot be built with the
    /// configured timeout
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("cannot build HTTP client: {e}")))?;
        Ok(Self::with_client(http, &config.base_url))
    }

    /// Create a client around an existing `reqwest::Client`
    #[must_use]
    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the environment holds invalid values
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(&ClientConfig::from_env()?)
    }

    /// Configured base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a relative endpoint path
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Perform a request and decode the response
    ///
    /// # Errors
    ///
    /// - `ApiError::Network` if no response was received
    /// - `ApiError::Http` for any non-success status
    /// - `ApiError::Cancelled` if the request's token fired first
    pub async fn call(&self, request: EndpointRequest) -> Result<EndpointResponse, ApiError> {
        let url = self.url_for(request.path());
        tracing::debug!(method = %request.method(), %url, "calling endpoint");

        let builder = self.build(&url, &request);
        let cancel = request.cancellation().cloned();
        Self::execute(builder, cancel.as_ref(), &url).await
    }

    /// `PUT` raw bytes to an absolute URL (signed upload destinations)
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::call`]
    pub async fn put_bytes(
        &self,
        url: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<EndpointResponse, ApiError> {
        tracing::debug!(%url, bytes = bytes.len(), "uploading object");

        let builder = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        Self::execute(builder, cancel, url).await
    }

    /// Open a streamed response
    ///
    /// Returns the decoded event stream once a success status is received.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or a non-success initial status.
    /// Individual stream items carry `ApiError::Stream` on transport failure.
    pub async fn stream(&self, request: EndpointRequest) -> Result<EventStream, ApiError> {
        let url = self.url_for(request.path());
        tracing::debug!(method = %request.method(), %url, "opening stream");

        let cancel = request.cancellation().cloned();
        let response = race(cancel.as_ref(), self.build(&url, &request).send()).await??;

        if !response.status().is_success() {
            return Err(Self::failure(response, cancel.as_ref()).await);
        }

        Ok(decode(response.bytes_stream(), cancel))
    }

    fn build(&self, url: &str, request: &EndpointRequest) -> RequestBuilder {
        let mut builder = self
            .http
            .request(request.method().clone(), url)
            .query(request.query());

        // Caller headers win over the body's content type.
        let caller_content_type = request
            .headers()
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));

        let (content_type, body) = match request.body() {
            RequestBody::Empty => (None, None),
            RequestBody::Json(value) => (Some(JSON_CONTENT_TYPE), Some(value.to_string().into_bytes())),
            RequestBody::Raw { bytes, content_type } => (Some(content_type.as_str()), Some(bytes.clone())),
        };
        if let Some(content_type) = content_type.filter(|_| !caller_content_type) {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    async fn execute(
        builder: RequestBuilder,
        cancel: Option<&CancellationToken>,
        url: &str,
    ) -> Result<EndpointResponse, ApiError> {
        let response = race(cancel, builder.send()).await??;
        let status = response.status();

        if !status.is_success() {
            let err = Self::failure(response, cancel).await;
            tracing::debug!(%url, status = status.as_u16(), error = %err, "endpoint failed");
            return Err(err);
        }

        let body = read_body(response, cancel).await?;
        tracing::debug!(%url, status = status.as_u16(), "endpoint succeeded");
        Ok(EndpointResponse {
            status: status.as_u16(),
            body,
        })
    }

    async fn failure(response: Response, cancel: Option<&CancellationToken>) -> ApiError {
        let status = response.status();
        match read_body(response, cancel).await {
            Ok(body) => ApiError::http(status.as_u16(), status.canonical_reason(), body),
            Err(ApiError::Cancelled) => ApiError::Cancelled,
            Err(_) => ApiError::http(status.as_u16(), status.canonical_reason(), ResponseBody::Empty),
        }
    }
}

async fn read_body(
    response: Response,
    cancel: Option<&CancellationToken>,
) -> Result<ResponseBody, ApiError> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = race(cancel, response.bytes()).await??;
    Ok(ResponseBody::decode(content_type.as_deref(), &bytes))
}

/// Run `fut` unless `cancel` fires first.
async fn race<F, T>(
    cancel: Option<&CancellationToken>,
    fut: F,
) -> Result<Result<T, ApiError>, ApiError>
where
    F: Future<Output = Result<T, reqwest::Error>>,
{
    match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => Err(ApiError::Cancelled),
            out = fut => Ok(out.map_err(ApiError::from)),
        },
        None => Ok(fut.await.map_err(ApiError::from)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = RequestClient::new(&ClientConfig {
            base_url: "http://api.test/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://api.test");
    }

    #[test]
    fn test_url_for_joins_paths() {
        let client = RequestClient::with_client(Client::new(), "http://api.test");
        assert_eq!(client.url_for("/v1/products/"), "http://api.test/v1/products/");
        assert_eq!(client.url_for("v1/products"), "http://api.test/v1/products");
    }
}
