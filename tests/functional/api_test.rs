//! Functional tests for the HTTP surface

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use text2img_gateway::api::routes::create_router;
use text2img_gateway::backend::TEXT2IMG_PATH;
use text2img_gateway::config::Settings;
use text2img_gateway::AppState;

use crate::common::{cat_request_json, processing_body, settings, success_body};

fn app(settings: Settings) -> Router {
    create_router(Arc::new(AppState::from_settings(settings).unwrap()))
}

fn post_text2img(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v6/images/text2img")
        .header(CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app(settings("http://127.0.0.1:1"))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_models_endpoint_lists_capabilities() {
    let response = app(settings("http://127.0.0.1:1"))
        .oneshot(Request::builder().uri("/models").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0]["id"], "flux");
    assert_eq!(models[0]["capabilities"]["maxWidth"], 768);
    assert_eq!(models[0]["capabilities"]["supportsUpscale"], false);
    assert_eq!(models[1]["id"], "midjourney");
    assert_eq!(models[1]["capabilities"]["supportsTomeSD"], true);
}

#[tokio::test]
async fn test_text2img_success_returns_remote_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(success_body(&["https://cdn.example/cat.png"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = app(settings(&server.uri()))
        .oneshot(post_text2img(cat_request_json().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["output"], json!(["https://cdn.example/cat.png"]));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let response = app(settings("http://127.0.0.1:1"))
        .oneshot(post_text2img("{\"model_id\": \"flux\", "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert!(body["message"].as_str().unwrap().contains("Invalid request body"));
}

#[tokio::test]
async fn test_validation_errors_are_listed() {
    let server = MockServer::start().await;

    let mut request = cat_request_json();
    request["width"] = json!(1024);
    request["upscale"] = json!("2");

    let response = app(settings(&server.uri()))
        .oneshot(post_text2img(request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "INVALID_REQUEST");
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert!(details.iter().any(|d| d.as_str().unwrap().starts_with("width:")));
    assert!(details.iter().any(|d| d.as_str().unwrap().starts_with("upscale:")));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_model_is_bad_request() {
    let mut request = cat_request_json();
    request["model_id"] = json!("sdxl");

    let response = app(settings("http://127.0.0.1:1"))
        .oneshot(post_text2img(request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Model with ID sdxl not found");
}

#[tokio::test]
async fn test_remote_unauthorized_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let response = app(settings(&server.uri()))
        .oneshot(post_text2img(cat_request_json().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_remote_outage_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let response = app(settings(&server.uri()))
        .oneshot(post_text2img(cat_request_json().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(response).await;
    assert_eq!(body["code"], "EXTERNAL_API_ERROR");
}

#[tokio::test]
async fn test_polling_exhaustion_is_gateway_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(processing_body(11)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/text2img/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processing_body(11)))
        .mount(&server)
        .await;

    let response = app(settings(&server.uri()))
        .oneshot(post_text2img(cat_request_json().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = read_json(response).await;
    assert_eq!(body["code"], "TIMEOUT");
}

#[tokio::test]
async fn test_write_timeout_bounds_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success_body(&["https://cdn.example/slow.png"]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut settings = settings(&server.uri());
    settings.server.write_timeout_secs = 1;

    let response = app(settings)
        .oneshot(post_text2img(cat_request_json().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = read_json(response).await;
    assert_eq!(body["code"], "TIMEOUT");
}
