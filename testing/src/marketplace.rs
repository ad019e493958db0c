//! In-memory marketplace backend.
//!
//! [`InMemoryMarketplace`] keeps products in insertion order, records every
//! call, and lets tests script failures per operation. Operations can also
//! be held so that they never complete, which is how in-flight cancellation
//! is exercised. Catalog pages are served from the product list unless raw
//! pages have been queued with [`InMemoryMarketplace::push_page`].

use crate::helpers::byte_source;
use artisan_studio_core::{Cursor, ProductPage, ProductPayload, ProductRecord};
use artisan_studio_http::{ApiError, CancellationToken, EventStream, ResponseBody, decode};
use artisan_studio_workflow::backend::{
    BackendFuture, GenerateRequest, GenerateResponse, GeneratedItem, MarketingSuggestion,
    MarketplaceBackend, PostOptions, PostResponse, QuickTextRequest, QuickTextResponse,
    SignedUpload, SuggestRequest, TaglineRequest,
};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Backend operation, used to script failures and inspect calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list_products`
    ListProducts,
    /// `get_product`
    GetProduct,
    /// `set_active`
    SetActive,
    /// `upsert_product`
    UpsertProduct,
    /// `quick_text`
    QuickText,
    /// `generate`
    Generate,
    /// `suggest`
    Suggest,
    /// `create_post`
    CreatePost,
    /// `signed_upload`
    SignedUpload,
    /// `put_object`
    PutObject,
    /// `stream_taglines`
    StreamTaglines,
}

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    /// Operation called
    pub operation: Operation,
    /// Product id, URL or file name the call targeted
    pub target: String,
    /// Request body / arguments as JSON
    pub body: Value,
}

#[derive(Debug)]
struct State {
    products: Vec<ProductRecord>,
    pages: VecDeque<ProductPage>,
    failures: HashMap<Operation, VecDeque<ApiError>>,
    held: HashSet<Operation>,
    calls: Vec<RecordedCall>,
    uploads: HashMap<String, Vec<u8>>,
    quick_text: QuickTextResponse,
    generated: GenerateResponse,
    suggestion: MarketingSuggestion,
    post: PostResponse,
    signed: Option<SignedUpload>,
    tagline_chunks: Vec<Vec<u8>>,
}

/// In-memory [`MarketplaceBackend`] for deterministic tests.
#[derive(Debug)]
pub struct InMemoryMarketplace {
    state: Mutex<State>,
}

impl Default for InMemoryMarketplace {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMarketplace {
    /// Empty marketplace with canned generation responses
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                products: Vec::new(),
                pages: VecDeque::new(),
                failures: HashMap::new(),
                held: HashSet::new(),
                calls: Vec::new(),
                uploads: HashMap::new(),
                quick_text: QuickTextResponse {
                    description: Some("A generated description.".to_string()),
                    story: Some("A generated story.".to_string()),
                },
                generated: GenerateResponse {
                    items: vec![GeneratedItem {
                        text: Some("Generated heritage story.".to_string()),
                        gcs_uri: None,
                    }],
                },
                suggestion: MarketingSuggestion {
                    hashtags: vec!["#handmade".to_string(), "#artisan".to_string()],
                    best_time: Some("18:00".to_string()),
                },
                post: PostResponse(json!({ "item": { "post_text": "Meet our newest piece." } })),
                signed: None,
                tagline_chunks: Vec::new(),
            }),
        }
    }

    /// Marketplace pre-filled with `count` products `p00`, `p01`, ...
    #[must_use]
    pub fn with_products(count: usize) -> Self {
        let marketplace = Self::new();
        for i in 0..count {
            marketplace.insert(product(&format!("p{i:02}")));
        }
        marketplace
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a product
    pub fn insert(&self, record: ProductRecord) {
        let mut state = self.lock();
        match state.products.iter_mut().find(|p| p.id == record.id) {
            Some(existing) => *existing = record,
            None => state.products.push(record),
        }
    }

    /// Queue a raw page for the next `list_products` call.
    ///
    /// Queued pages are served in order, ahead of the product list, and
    /// regardless of the requested cursor.
    pub fn push_page(&self, page: ProductPage) {
        self.lock().pages.push_back(page);
    }

    /// Make the next call to `operation` fail with `error` (queued, FIFO)
    pub fn fail_next(&self, operation: Operation, error: ApiError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Make every future call to `operation` hang until dropped
    pub fn hold(&self, operation: Operation) {
        self.lock().held.insert(operation);
    }

    /// Response for quick text
    pub fn set_quick_text(&self, response: QuickTextResponse) {
        self.lock().quick_text = response;
    }

    /// Response for story generation
    pub fn set_generated(&self, response: GenerateResponse) {
        self.lock().generated = response;
    }

    /// Response for marketing suggestions
    pub fn set_suggestion(&self, suggestion: MarketingSuggestion) {
        self.lock().suggestion = suggestion;
    }

    /// Response for post composition
    pub fn set_post(&self, post: Value) {
        self.lock().post = PostResponse(post);
    }

    /// Signed upload destination (default: one per file name)
    pub fn set_signed_upload(&self, signed: SignedUpload) {
        self.lock().signed = Some(signed);
    }

    /// Raw chunks served by the tagline stream
    pub fn set_tagline_chunks<I, C>(&self, chunks: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        self.lock().tagline_chunks = chunks.into_iter().map(Into::into).collect();
    }

    /// Every call so far
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Calls to one operation
    #[must_use]
    pub fn calls_to(&self, operation: Operation) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Snapshot of one product
    #[must_use]
    pub fn product(&self, id: &str) -> Option<ProductRecord> {
        self.lock().products.iter().find(|p| p.id == id).cloned()
    }

    /// Bytes stored at `url` by `put_object`
    #[must_use]
    pub fn uploaded(&self, url: &str) -> Option<Vec<u8>> {
        self.lock().uploads.get(url).cloned()
    }

    /// Record the call; return the scripted failure, or whether it is held.
    fn enter(&self, operation: Operation, target: &str, body: Value) -> Entry<'_> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            operation,
            target: target.to_string(),
            body,
        });
        if state.held.contains(&operation) {
            return Entry::Held;
        }
        let scripted = state.failures.get_mut(&operation).and_then(VecDeque::pop_front);
        match scripted {
            Some(err) => Entry::Fail(err),
            None => Entry::Proceed(state),
        }
    }
}

enum Entry<'a> {
    Proceed(MutexGuard<'a, State>),
    Fail(ApiError),
    Held,
}

impl Entry<'_> {
    fn respond<T, F>(self, handle: F) -> BackendFuture<'static, T>
    where
        T: Send + 'static,
        F: FnOnce(&mut State) -> Result<T, ApiError>,
    {
        match self {
            Self::Proceed(mut state) => Box::pin(std::future::ready(handle(&mut *state))),
            Self::Fail(err) => Box::pin(std::future::ready(Err(err))),
            Self::Held => Box::pin(std::future::pending()),
        }
    }
}

fn not_found(id: &str) -> ApiError {
    ApiError::http(
        404,
        Some("Not Found"),
        ResponseBody::Structured(json!({ "detail": format!("Product {id} not found") })),
    )
}

fn cursor_ts(index: usize) -> String {
    format!("2025-01-01T00:{:02}:{:02}Z", index / 60 % 60, index % 60)
}

/// A minimal active product record.
#[must_use]
pub fn product(id: &str) -> ProductRecord {
    ProductRecord {
        id: id.to_string(),
        title: Some(format!("Product {id}")),
        category: Some("Pottery".to_string()),
        materials: vec!["Clay".to_string()],
        inventory: Some(1),
        is_active: Some(true),
        ..ProductRecord::default()
    }
}

impl MarketplaceBackend for InMemoryMarketplace {
    fn list_products(&self, limit: u32, cursor: Option<Cursor>) -> BackendFuture<'_, ProductPage> {
        let body = json!({
            "limit": limit,
            "cursor": cursor.as_ref().map(|c| json!({ "ts": c.ts, "id": c.id })),
        });
        self.enter(Operation::ListProducts, "/v1/products/", body)
            .respond(|state| {
                if let Some(page) = state.pages.pop_front() {
                    return Ok(page);
                }
                let active: Vec<(usize, &ProductRecord)> = state
                    .products
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.is_active != Some(false))
                    .collect();

                let start = cursor
                    .filter(Cursor::is_complete)
                    .and_then(|c| active.iter().position(|(_, p)| p.id == c.id).map(|i| i + 1))
                    .unwrap_or(0);
                let limit = usize::try_from(limit).unwrap_or(usize::MAX).max(1);
                let end = start.saturating_add(limit).min(active.len());
                let page = active.get(start..end).unwrap_or_default();

                let next = match page.last() {
                    Some((index, last)) if end < active.len() => {
                        Some(Cursor::new(cursor_ts(*index), last.id.clone()))
                    }
                    _ => None,
                };
                Ok(ProductPage {
                    items: page.iter().map(|(_, p)| (*p).clone()).collect(),
                    next,
                })
            })
    }

    fn get_product(&self, id: String) -> BackendFuture<'_, ProductRecord> {
        self.enter(Operation::GetProduct, &id, Value::Null)
            .respond(move |state| {
                state
                    .products
                    .iter()
                    .find(|p| p.id == id)
                    .cloned()
                    .ok_or_else(|| not_found(&id))
            })
    }

    fn set_active(&self, id: String, active: bool) -> BackendFuture<'_, ()> {
        self.enter(Operation::SetActive, &id, json!({ "is_active": active }))
            .respond(move |state| {
                let product = state
                    .products
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| not_found(&id))?;
                product.is_active = Some(active);
                Ok(())
            })
    }

    fn upsert_product(&self, payload: ProductPayload) -> BackendFuture<'_, ()> {
        let body = serde_json::to_value(&payload).unwrap_or(Value::Null);
        self.enter(Operation::UpsertProduct, &payload.id, body)
            .respond(move |state| {
                let record = ProductRecord {
                    id: payload.id.clone(),
                    title: Some(payload.title),
                    category: Some(payload.category),
                    materials: payload.materials,
                    images: payload.images.unwrap_or_default(),
                    inventory: Some(i64::from(payload.inventory)),
                    is_active: Some(payload.is_active),
                    ..ProductRecord::default()
                };
                match state.products.iter_mut().find(|p| p.id == payload.id) {
                    Some(existing) => *existing = record,
                    None => state.products.push(record),
                }
                Ok(())
            })
    }

    fn quick_text(&self, id: String, request: QuickTextRequest) -> BackendFuture<'_, QuickTextResponse> {
        let body = serde_json::to_value(&request).unwrap_or(Value::Null);
        self.enter(Operation::QuickText, &id, body)
            .respond(|state| Ok(state.quick_text.clone()))
    }

    fn generate(&self, id: String, request: GenerateRequest) -> BackendFuture<'_, GenerateResponse> {
        let body = serde_json::to_value(&request).unwrap_or(Value::Null);
        self.enter(Operation::Generate, &id, body)
            .respond(|state| Ok(state.generated.clone()))
    }

    fn suggest(&self, request: SuggestRequest) -> BackendFuture<'_, MarketingSuggestion> {
        let body = serde_json::to_value(&request).unwrap_or(Value::Null);
        self.enter(Operation::Suggest, &request.product_id, body)
            .respond(|state| Ok(state.suggestion.clone()))
    }

    fn create_post(
        &self,
        id: String,
        options: PostOptions,
        hashtags: Option<Vec<String>>,
    ) -> BackendFuture<'_, PostResponse> {
        let body = json!({ "options": options, "hashtags": hashtags });
        self.enter(Operation::CreatePost, &id, body)
            .respond(|state| Ok(state.post.clone()))
    }

    fn signed_upload(&self, filename: String, content_type: String) -> BackendFuture<'_, SignedUpload> {
        let body = json!({ "contentType": content_type });
        self.enter(Operation::SignedUpload, &filename, body)
            .respond(move |state| {
                Ok(state.signed.clone().unwrap_or_else(|| SignedUpload {
                    upload_url: Some(format!("memory://uploads/{filename}")),
                    public_url: format!("https://storage.example.com/uploads/{filename}"),
                }))
            })
    }

    fn put_object(
        &self,
        url: String,
        bytes: Vec<u8>,
        content_type: String,
        _cancel: CancellationToken,
    ) -> BackendFuture<'_, ()> {
        let body = json!({ "contentType": content_type, "len": bytes.len() });
        self.enter(Operation::PutObject, &url, body)
            .respond(move |state| {
                state.uploads.insert(url, bytes);
                Ok(())
            })
    }

    fn stream_taglines(
        &self,
        request: TaglineRequest,
        cancel: CancellationToken,
    ) -> BackendFuture<'_, EventStream> {
        let body = serde_json::to_value(&request).unwrap_or(Value::Null);
        self.enter(Operation::StreamTaglines, &request.product_id, body)
            .respond(|state| {
                let chunks = state.tagline_chunks.clone();
                Ok(decode(byte_source(chunks), Some(cancel)))
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_cover_catalog_once() {
        let marketplace = InMemoryMarketplace::with_products(5);

        let first = marketplace.list_products(2, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let next = first.next.unwrap();
        assert_eq!(next.id, "p01");

        let second = marketplace.list_products(2, Some(next)).await.unwrap();
        assert_eq!(second.items[0].id, "p02");

        let third = marketplace.list_products(2, second.next).await.unwrap();
        assert_eq!(third.items.len(), 1);
        assert!(third.next.is_none());
    }

    #[tokio::test]
    async fn test_queued_pages_come_first() {
        let marketplace = InMemoryMarketplace::with_products(1);
        marketplace.push_page(ProductPage {
            items: Vec::new(),
            next: Some(Cursor::new("t", "x")),
        });

        let scripted = marketplace.list_products(24, None).await.unwrap();
        assert!(scripted.items.is_empty());
        assert!(scripted.next.is_some());

        let live = marketplace.list_products(24, None).await.unwrap();
        assert_eq!(live.items[0].id, "p00");
    }

    #[tokio::test]
    async fn test_scripted_failure_is_consumed_once() {
        let marketplace = InMemoryMarketplace::with_products(1);
        marketplace.fail_next(Operation::SetActive, ApiError::Network("offline".into()));

        assert!(marketplace.set_active("p00".into(), false).await.is_err());
        assert!(marketplace.set_active("p00".into(), false).await.is_ok());
        assert_eq!(marketplace.calls_to(Operation::SetActive).len(), 2);
        assert_eq!(marketplace.product("p00").unwrap().is_active, Some(false));
    }
}
