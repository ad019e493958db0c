//! # Artisan Studio HTTP
//!
//! Request pipeline and streamed response decoder for the Artisan Studio
//! marketplace API.
//!
//! ## Example
//!
//! ```no_run
//! use artisan_studio_http::{EndpointRequest, RequestClient};
//! use futures::StreamExt;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base URL and timeout from ARTISAN_API_BASE_URL / ARTISAN_HTTP_TIMEOUT_SECS
//!     let client = RequestClient::from_env()?;
//!
//!     let response = client
//!         .call(EndpointRequest::get("/v1/products/").with_query("limit", "24"))
//!         .await?;
//!     println!("status {}", response.status);
//!
//!     let request = EndpointRequest::post("/v1/marketing/taglines")
//!         .with_json(&json!({ "product_id": "blue-pottery-vase" }))?;
//!     let mut events = client.stream(request).await?;
//!     while let Some(event) = events.next().await {
//!         println!("{:?}", event?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - JSON, text and empty bodies decoded by declared content type
//! - Server error messages extracted from `detail` / `message`
//! - Cancellation through `tokio_util` tokens
//! - Newline-delimited / SSE stream decoding, robust to arbitrary chunking

pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod stream;

// Re-export main types for convenience
pub use client::RequestClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use request::{EndpointRequest, Method, RequestBody, encode_segment};
pub use response::{ContentKind, EndpointResponse, ResponseBody};
pub use stream::{EventStream, LineBuffer, classify_line, decode};
pub use tokio_util::sync::CancellationToken;
