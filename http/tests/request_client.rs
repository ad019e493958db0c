//! `RequestClient` against a local mock server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use artisan_studio_core::StreamEvent;
use artisan_studio_http::{
    ApiError, CancellationToken, ContentKind, EndpointRequest, RequestClient, ResponseBody,
};
use futures::StreamExt;
use serde_json::{Value, json};
use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, RequestClient) {
    let server = MockServer::start().await;
    let client = RequestClient::with_client(reqwest::Client::new(), &server.uri());
    (server, client)
}

#[tokio::test]
async fn test_json_response_is_structured() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/products/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "p1" })))
        .mount(&server)
        .await;

    let response = client.call(EndpointRequest::get("/v1/products/p1")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.content_kind(), ContentKind::Structured);
    let value: Value = response.json().unwrap();
    assert_eq!(value["id"], "p1");
}

#[tokio::test]
async fn test_text_and_empty_responses() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let text = client.call(EndpointRequest::get("/text")).await.unwrap();
    assert_eq!(text.body, ResponseBody::Text("hello".into()));

    let empty = client.call(EndpointRequest::get("/empty")).await.unwrap();
    assert_eq!(empty.status, 204);
    assert_eq!(empty.content_kind(), ContentKind::None);
}

#[tokio::test]
async fn test_error_detail_becomes_message() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/products/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found" })))
        .mount(&server)
        .await;

    let err = client
        .call(EndpointRequest::get("/v1/products/missing"))
        .await
        .unwrap_err();

    match err {
        ApiError::Http { status, ref message, ref body } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not found");
            assert_eq!(body, &ResponseBody::Structured(json!({ "detail": "Not found" })));
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_without_detail_uses_reason_phrase() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/boom"))
        .respond_with(ResponseTemplate::new(500).set_body_string("stack trace"))
        .mount(&server)
        .await;

    let err = client.call(EndpointRequest::post("/boom")).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "500 Internal Server Error");
}

#[tokio::test]
async fn test_json_body_and_content_type_are_sent() {
    let (server, client) = setup().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/products/p1"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "is_active": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let request = EndpointRequest::patch("/v1/products/p1")
        .with_json(&json!({ "is_active": false }))
        .unwrap();
    client.call(request).await.unwrap();
}

#[tokio::test]
async fn test_put_bytes_passes_raw_payload() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/bucket/object.png"))
        .and(header("content-type", "image/png"))
        .and(body_bytes(vec![1_u8, 2, 3]))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/bucket/object.png", server.uri());
    let response = client
        .put_bytes(&url, vec![1, 2, 3], "image/png", None)
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_query_parameters_are_sent() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/marketing/suggest"))
        .and(query_param("product_id", "blue vase"))
        .and(query_param("channel", "instagram"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hashtags": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let request = EndpointRequest::get("/v1/marketing/suggest")
        .with_query("product_id", "blue vase")
        .with_query("channel", "instagram");
    client.call(request).await.unwrap();
}

#[tokio::test]
async fn test_cancelled_token_short_circuits() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    token.cancel();
    let err = client
        .call(EndpointRequest::get("/anything").with_cancellation(token))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_stream_decodes_events() {
    let (server, client) = setup().await;
    let body = "data: {\"delta\":\"Hand\"}\n\ndata: {\"delta\":\"made\"}\n{\"text\":\"Done.\"}\n";
    Mock::given(method("POST"))
        .and(path("/v1/marketing/taglines"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let events: Vec<_> = client
        .stream(EndpointRequest::post("/v1/marketing/taglines"))
        .await
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Delta("Hand".into()),
            StreamEvent::Delta("made".into()),
            StreamEvent::Text("Done.".into()),
        ]
    );
}

#[tokio::test]
async fn test_stream_rejects_error_status() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({ "message": "upstream" })))
        .mount(&server)
        .await;

    let Err(err) = client.stream(EndpointRequest::post("/v1/marketing/taglines")).await else {
        panic!("expected error status to fail the stream");
    };
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), "upstream");
}
