//! Marketplace backend abstraction.
//!
//! The workflow, the optimistic mutation manager and the catalog pager all
//! talk to the marketplace through [`MarketplaceBackend`], never through the
//! HTTP client directly.
//!
//! # Implementations
//!
//! - `HttpMarketplace` (in this crate): the real API over `RequestClient`
//! - `InMemoryMarketplace` (in `artisan-studio-testing`): scripted, deterministic tests

use artisan_studio_core::{Cursor, ProductPage, ProductPayload, ProductRecord};
use artisan_studio_http::{ApiError, CancellationToken, EventStream};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by backend operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Marketplace operations used by the client core.
///
/// # Dyn Compatibility
///
/// Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
/// backend can be shared as `Arc<dyn MarketplaceBackend>` between the
/// orchestrator and the catalog pager.
pub trait MarketplaceBackend: Send + Sync {
    /// `GET /v1/products/?limit=&cursor_ts=&cursor_id=`
    ///
    /// The cursor is only sent when both of its parts are non-empty.
    fn list_products(&self, limit: u32, cursor: Option<Cursor>) -> BackendFuture<'_, ProductPage>;

    /// `GET /v1/products/{id}`
    fn get_product(&self, id: String) -> BackendFuture<'_, ProductRecord>;

    /// `PATCH /v1/products/{id}` with `{is_active}` (soft delete when `false`)
    fn set_active(&self, id: String, active: bool) -> BackendFuture<'_, ()>;

    /// `POST /v1/products/{id}`: idempotent create-or-replace
    fn upsert_product(&self, payload: ProductPayload) -> BackendFuture<'_, ()>;

    /// `POST /v1/products/{id}/quicktext`
    fn quick_text(&self, id: String, request: QuickTextRequest) -> BackendFuture<'_, QuickTextResponse>;

    /// `POST /v1/products/{id}/generate`
    fn generate(&self, id: String, request: GenerateRequest) -> BackendFuture<'_, GenerateResponse>;

    /// `GET /v1/marketing/suggest?product_id=&channel=&lang=`
    fn suggest(&self, request: SuggestRequest) -> BackendFuture<'_, MarketingSuggestion>;

    /// `POST /v1/marketing/{id}/post?channel=&lang=&tone=` with the tag list
    /// (or `null`) as body
    fn create_post(
        &self,
        id: String,
        options: PostOptions,
        hashtags: Option<Vec<String>>,
    ) -> BackendFuture<'_, PostResponse>;

    /// `GET /v1/uploads/signed-url?filename=&contentType=`
    fn signed_upload(&self, filename: String, content_type: String) -> BackendFuture<'_, SignedUpload>;

    /// Direct `PUT` of raw bytes to a signed upload URL, abandoned when
    /// `cancel` fires
    fn put_object(
        &self,
        url: String,
        bytes: Vec<u8>,
        content_type: String,
        cancel: CancellationToken,
    ) -> BackendFuture<'_, ()>;

    /// `POST /v1/marketing/taglines`, streamed until the body ends or
    /// `cancel` fires
    fn stream_taglines(
        &self,
        request: TaglineRequest,
        cancel: CancellationToken,
    ) -> BackendFuture<'_, EventStream>;
}

/// Which fields quick text should produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickTextMode {
    /// Description and story
    #[default]
    Both,
    /// Description only
    Description,
    /// Story only
    Story,
}

/// Body of the quick text endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuickTextRequest {
    /// Draft fields filled in so far
    pub patch: ProductPayload,
    /// Fields to produce
    pub mode: QuickTextMode,
    /// Whether the server should store the result
    pub persist: bool,
}

/// Quick text result; either field may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickTextResponse {
    /// Generated description
    #[serde(default)]
    pub description: Option<String>,
    /// Generated story
    #[serde(default)]
    pub story: Option<String>,
}

/// Body of the story generation endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Target languages
    pub langs: Vec<String>,
    /// Writing tone
    pub tone: String,
}

/// One generated story item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedItem {
    /// Inline text
    #[serde(default)]
    pub text: Option<String>,
    /// Stored object reference
    #[serde(default)]
    pub gcs_uri: Option<String>,
}

/// Story generation result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated items, one per language
    #[serde(default)]
    pub items: Vec<GeneratedItem>,
}

impl GenerateResponse {
    /// Story text: first item's non-empty `text`, else its `gcs_uri`, else a stub.
    #[must_use]
    pub fn story_text(&self) -> String {
        let first = self.items.first();
        first
            .and_then(|item| non_empty(item.text.as_deref()))
            .or_else(|| first.and_then(|item| non_empty(item.gcs_uri.as_deref())))
            .unwrap_or("Generated (stub).")
            .to_string()
    }
}

/// Query of the marketing suggestion endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestRequest {
    /// Product id
    pub product_id: String,
    /// Social channel
    pub channel: String,
    /// Language
    pub lang: String,
}

/// Marketing suggestions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketingSuggestion {
    /// Suggested hashtags, possibly with leading `#`
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Suggested posting time
    #[serde(default)]
    pub best_time: Option<String>,
}

impl MarketingSuggestion {
    /// Hashtags without leading `#` markers; empty tags dropped.
    #[must_use]
    pub fn normalized_hashtags(&self) -> Vec<String> {
        self.hashtags
            .iter()
            .map(|tag| tag.trim().trim_start_matches('#').trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Options of the post composition endpoint (sent as query parameters).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOptions {
    /// Social channel
    pub channel: String,
    /// Language
    pub lang: String,
    /// Writing tone
    pub tone: String,
}

/// Raw post composition result.
///
/// Servers have answered with the post under `item`, under `doc`, or at the
/// root, so the body is kept as a value and read through [`Self::post_item`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostResponse(pub Value);

/// A composed marketing post.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketingPostItem {
    /// Post text
    #[serde(default)]
    pub post_text: Option<String>,
    /// Alternative text field
    #[serde(default)]
    pub text: Option<String>,
    /// Generated image
    #[serde(default)]
    pub image_uri: Option<String>,
}

impl MarketingPostItem {
    /// `post_text`, else `text`, else `"Post created."`.
    #[must_use]
    pub fn post_text(&self) -> String {
        non_empty(self.post_text.as_deref())
            .or_else(|| non_empty(self.text.as_deref()))
            .unwrap_or("Post created.")
            .to_string()
    }
}

impl PostResponse {
    /// Post object from `item`, else `doc`, else the root.
    #[must_use]
    pub fn post_item(&self) -> MarketingPostItem {
        let object = ["item", "doc"]
            .into_iter()
            .find_map(|key| self.0.get(key).filter(|v| v.is_object()))
            .unwrap_or(&self.0);
        MarketingPostItem::deserialize(object).unwrap_or_default()
    }
}

/// Signed upload destination.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUpload {
    /// Where to `PUT` the bytes; absent when the server stores nothing
    #[serde(default)]
    pub upload_url: Option<String>,
    /// Public URL of the stored object
    #[serde(default)]
    pub public_url: String,
}

/// Body of the streamed tagline endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaglineRequest {
    /// Product id
    pub product_id: String,
    /// Social channel
    pub channel: String,
    /// Language
    pub lang: String,
    /// Writing tone
    pub tone: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
