//! `HttpMarketplace` request shapes against a local mock server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use artisan_studio_core::{Cursor, ProductDraft};
use artisan_studio_http::{ApiError, CancellationToken, ClientConfig, RequestClient};
use artisan_studio_workflow::{
    CatalogPager, HttpMarketplace, MarketplaceBackend, PostOptions, QuickTextMode, QuickTextRequest,
    SuggestRequest,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, HttpMarketplace) {
    let server = MockServer::start().await;
    let client = RequestClient::new(&ClientConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    })
    .unwrap();
    (server, HttpMarketplace::new(client))
}

#[tokio::test]
async fn test_list_products_sends_complete_cursor_only() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/products/"))
        .and(query_param("limit", "24"))
        .and(query_param_is_missing("cursor_ts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "p1", "title": "Vase" }],
            "next": { "ts": "2025-01-01T00:00:00Z", "id": "p1" }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let page = backend.list_products(24, None).await.unwrap();
    assert_eq!(page.items[0].id, "p1");
    assert_eq!(page.next, Some(Cursor::new("2025-01-01T00:00:00Z", "p1")));

    // Half a cursor is not sent at all
    backend
        .list_products(24, Some(Cursor::new("", "p1")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_products_with_cursor() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/products/"))
        .and(query_param("cursor_ts", "2025-01-01T00:00:00Z"))
        .and(query_param("cursor_id", "p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let page = backend
        .list_products(24, Some(Cursor::new("2025-01-01T00:00:00Z", "p1")))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(page.next.is_none());
}

#[tokio::test]
async fn test_soft_delete_patches_is_active() {
    let (server, backend) = setup().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/products/blue%20vase"))
        .and(body_json(json!({ "is_active": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    backend.set_active("blue vase".to_string(), false).await.unwrap();
}

#[tokio::test]
async fn test_quick_text_body_shape() {
    let (server, backend) = setup().await;
    let mut draft = ProductDraft::new();
    draft.title = "Vase".to_string();
    let patch = draft.to_payload("vase");

    Mock::given(method("POST"))
        .and(path("/v1/products/vase/quicktext"))
        .and(body_json(json!({
            "patch": serde_json::to_value(&patch).unwrap(),
            "mode": "both",
            "persist": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "description": "Nice" })))
        .mount(&server)
        .await;

    let response = backend
        .quick_text(
            "vase".to_string(),
            QuickTextRequest {
                patch,
                mode: QuickTextMode::Both,
                persist: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(response.description.as_deref(), Some("Nice"));
    assert_eq!(response.story, None);
}

#[tokio::test]
async fn test_suggest_and_post() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/marketing/suggest"))
        .and(query_param("product_id", "vase"))
        .and(query_param("lang", "en"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "hashtags": ["#clay"], "best_time": "09:00" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/marketing/vase/post"))
        .and(query_param("tone", "Warm"))
        .and(body_json(json!(null)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "item": { "post_text": "Hi" } })))
        .mount(&server)
        .await;

    let suggestion = backend
        .suggest(SuggestRequest {
            product_id: "vase".into(),
            channel: "instagram".into(),
            lang: "en".into(),
        })
        .await
        .unwrap();
    assert_eq!(suggestion.normalized_hashtags(), vec!["clay"]);

    let options = PostOptions {
        channel: "instagram".into(),
        lang: "en".into(),
        tone: "Warm".into(),
    };
    let post = backend.create_post("vase".into(), options, None).await.unwrap();
    assert_eq!(post.post_item().post_text(), "Hi");
}

#[tokio::test]
async fn test_signed_upload_without_public_url_is_an_error() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/uploads/signed-url"))
        .and(query_param("filename", "a.png"))
        .and(query_param("contentType", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upload_url": "http://x" })))
        .mount(&server)
        .await;

    let err = backend
        .signed_upload("a.png".into(), "image/png".into())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_get_product_reads_lenient_record() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/products/vase"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "vase",
            "title": "Vase",
            "unexpected": [1, 2, 3]
        })))
        .mount(&server)
        .await;

    let record = backend.get_product("vase".into()).await.unwrap();
    assert_eq!(record.id, "vase");
    assert_eq!(record.title.as_deref(), Some("Vase"));
}

#[tokio::test]
async fn test_http_failure_carries_status() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/products/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "not found" })))
        .mount(&server)
        .await;

    let err = backend.get_product("missing".into()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "not found");
}

#[tokio::test]
async fn test_page_with_null_collections_still_loads() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/products/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "a", "materials": null, "images": null, "attributes": null },
                { "id": "b", "title": "Shawl", "materials": ["Silk"] }
            ],
            "next": null
        })))
        .mount(&server)
        .await;

    let mut pager = CatalogPager::new(Arc::new(backend), 24);
    let page = pager.load_first().await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].name, "Untitled");
    assert_eq!(page.items[1].kind, "Silk");
    assert!(pager.is_exhausted());
}

#[tokio::test]
async fn test_object_transfer_stops_when_cancelled() {
    let (server, backend) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/bucket/a.png"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let url = format!("{}/bucket/a.png", server.uri());
    let (result, ()) = tokio::join!(
        backend.put_object(url, vec![1, 2, 3], "image/png".into(), token.clone()),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        }
    );

    assert!(matches!(result, Err(ApiError::Cancelled)));
}
