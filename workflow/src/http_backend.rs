//! [`MarketplaceBackend`] over the HTTP request pipeline.

use crate::backend::{
    BackendFuture, GenerateRequest, GenerateResponse, MarketingSuggestion, MarketplaceBackend,
    PostOptions, PostResponse, QuickTextRequest, QuickTextResponse, SignedUpload, SuggestRequest,
    TaglineRequest,
};
use artisan_studio_core::{Cursor, ProductPage, ProductPayload, ProductRecord};
use artisan_studio_http::{
    ApiError, CancellationToken, EndpointRequest, EventStream, RequestClient, encode_segment,
};
use serde_json::json;

/// The real marketplace API.
#[derive(Clone, Debug)]
pub struct HttpMarketplace {
    client: RequestClient,
}

impl HttpMarketplace {
    /// Wrap a request client
    #[must_use]
    pub const fn new(client: RequestClient) -> Self {
        Self { client }
    }

    /// Underlying request client
    #[must_use]
    pub const fn client(&self) -> &RequestClient {
        &self.client
    }
}

fn product_path(id: &str) -> String {
    format!("/v1/products/{}", encode_segment(id))
}

impl MarketplaceBackend for HttpMarketplace {
    fn list_products(&self, limit: u32, cursor: Option<Cursor>) -> BackendFuture<'_, ProductPage> {
        Box::pin(async move {
            let mut request = EndpointRequest::get("/v1/products/").with_query("limit", limit.to_string());
            if let Some(cursor) = cursor.filter(Cursor::is_complete) {
                request = request
                    .with_query("cursor_ts", cursor.ts)
                    .with_query("cursor_id", cursor.id);
            }
            self.client.call(request).await?.json()
        })
    }

    fn get_product(&self, id: String) -> BackendFuture<'_, ProductRecord> {
        Box::pin(async move {
            self.client
                .call(EndpointRequest::get(product_path(&id)))
                .await?
                .json()
        })
    }

    fn set_active(&self, id: String, active: bool) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            let request = EndpointRequest::patch(product_path(&id))
                .with_json_value(json!({ "is_active": active }));
            self.client.call(request).await?;
            Ok(())
        })
    }

    fn upsert_product(&self, payload: ProductPayload) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            let request = EndpointRequest::post(product_path(&payload.id)).with_json(&payload)?;
            self.client.call(request).await?;
            Ok(())
        })
    }

    fn quick_text(&self, id: String, request: QuickTextRequest) -> BackendFuture<'_, QuickTextResponse> {
        Box::pin(async move {
            let request =
                EndpointRequest::post(format!("{}/quicktext", product_path(&id))).with_json(&request)?;
            self.client.call(request).await?.json()
        })
    }

    fn generate(&self, id: String, request: GenerateRequest) -> BackendFuture<'_, GenerateResponse> {
        Box::pin(async move {
            let request =
                EndpointRequest::post(format!("{}/generate", product_path(&id))).with_json(&request)?;
            self.client.call(request).await?.json()
        })
    }

    fn suggest(&self, request: SuggestRequest) -> BackendFuture<'_, MarketingSuggestion> {
        Box::pin(async move {
            let request = EndpointRequest::get("/v1/marketing/suggest")
                .with_query("product_id", request.product_id)
                .with_query("channel", request.channel)
                .with_query("lang", request.lang);
            self.client.call(request).await?.json()
        })
    }

    fn create_post(
        &self,
        id: String,
        options: PostOptions,
        hashtags: Option<Vec<String>>,
    ) -> BackendFuture<'_, PostResponse> {
        Box::pin(async move {
            let request = EndpointRequest::post(format!("/v1/marketing/{}/post", encode_segment(&id)))
                .with_query("channel", options.channel)
                .with_query("lang", options.lang)
                .with_query("tone", options.tone)
                .with_json(&hashtags)?;
            Ok(PostResponse(self.client.call(request).await?.into_value()))
        })
    }

    fn signed_upload(&self, filename: String, content_type: String) -> BackendFuture<'_, SignedUpload> {
        Box::pin(async move {
            let request = EndpointRequest::get("/v1/uploads/signed-url")
                .with_query("filename", filename)
                .with_query("contentType", content_type);
            let upload: SignedUpload = self.client.call(request).await?.json()?;
            if upload.public_url.trim().is_empty() {
                return Err(ApiError::Decode("signed upload has no public_url".to_string()));
            }
            Ok(upload)
        })
    }

    fn put_object(
        &self,
        url: String,
        bytes: Vec<u8>,
        content_type: String,
        cancel: CancellationToken,
    ) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            self.client
                .put_bytes(&url, bytes, &content_type, Some(&cancel))
                .await?;
            Ok(())
        })
    }

    fn stream_taglines(
        &self,
        request: TaglineRequest,
        cancel: CancellationToken,
    ) -> BackendFuture<'_, EventStream> {
        Box::pin(async move {
            let request = EndpointRequest::post("/v1/marketing/taglines")
                .with_json(&request)?
                .with_cancellation(cancel);
            self.client.stream(request).await
        })
    }
}
