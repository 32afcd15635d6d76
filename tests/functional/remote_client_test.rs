//! Functional tests for the HTTP remote client: retry, error mapping, key placement

use serde_json::json;
use std::time::{Duration, Instant};
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use text2img_gateway::backend::{HttpRemoteClient, RemoteClient, TEXT2IMG_PATH};
use text2img_gateway::config::ApiKeyPlacement;
use text2img_gateway::AppError;

use crate::common::{remote_config, success_body, API_KEY};

fn submit_body() -> serde_json::Value {
    json!({ "model_id": "flux", "prompt": "a cat", "width": 512, "height": 512 })
}

#[tokio::test]
async fn test_retries_server_errors_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&["http://img/1.png"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRemoteClient::new(&remote_config(&server.uri())).unwrap();
    let started = Instant::now();
    let result = assert_ok!(client.submit(TEXT2IMG_PATH, submit_body()).await);

    assert!(result.is_success());
    assert_eq!(result.output, vec!["http://img/1.png".to_string()]);
    // Linear backoff with a 50ms unit: 50ms then 100ms.
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_persistent_server_error_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"status": "error", "message": "maintenance"})),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = HttpRemoteClient::new(&remote_config(&server.uri())).unwrap();
    let err = client.submit(TEXT2IMG_PATH, submit_body()).await.unwrap_err();

    assert!(matches!(err, AppError::ExternalApi(ref m) if m == "maintenance"));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"status": "error", "message": "prompt is too long"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRemoteClient::new(&remote_config(&server.uri())).unwrap();
    let err = client.submit(TEXT2IMG_PATH, submit_body()).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidRequest(ref m) if m == "prompt is too long"));
}

#[tokio::test]
async fn test_unauthorized_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRemoteClient::new(&remote_config(&server.uri())).unwrap();
    let err = client.submit(TEXT2IMG_PATH, submit_body()).await.unwrap_err();

    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_rate_limited_is_external_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRemoteClient::new(&remote_config(&server.uri())).unwrap();
    let err = client.submit(TEXT2IMG_PATH, submit_body()).await.unwrap_err();

    assert!(matches!(err, AppError::ExternalApi(ref m) if m.contains("rate limit")));
}

#[tokio::test]
async fn test_api_key_travels_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .and(body_partial_json(json!({ "key": API_KEY, "prompt": "a cat" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&["http://img/1.png"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRemoteClient::new(&remote_config(&server.uri())).unwrap();
    assert_ok!(client.submit(TEXT2IMG_PATH, submit_body()).await);
}

#[tokio::test]
async fn test_api_key_travels_in_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT2IMG_PATH))
        .and(header("authorization", format!("Bearer {}", API_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&["http://img/1.png"])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = remote_config(&server.uri());
    config.api_key_placement = ApiKeyPlacement::Header;
    let client = HttpRemoteClient::new(&config).unwrap();
    assert_ok!(client.submit(TEXT2IMG_PATH, submit_body()).await);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("key").is_none());
}

#[tokio::test]
async fn test_transport_failure_reports_attempts() {
    // Nothing listens on port 1.
    let client = HttpRemoteClient::new(&remote_config("http://127.0.0.1:1")).unwrap();
    let err = client.submit(TEXT2IMG_PATH, submit_body()).await.unwrap_err();

    assert!(matches!(err, AppError::ExternalApi(ref m) if m.contains("after 3 attempts")));
}

#[tokio::test]
async fn test_poll_is_single_shot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/text2img/42"))
        .and(header("authorization", format!("Bearer {}", API_KEY).as_str()))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRemoteClient::new(&remote_config(&server.uri())).unwrap();
    let err = client.poll("/images/text2img/42").await.unwrap_err();

    assert!(matches!(err, AppError::ExternalApi(ref m) if m.contains("bad gateway")));
}

#[tokio::test]
async fn test_images_field_is_folded_into_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/text2img/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "id": "7",
            "images": ["http://img/7.png"]
        })))
        .mount(&server)
        .await;

    let client = HttpRemoteClient::new(&remote_config(&server.uri())).unwrap();
    let result = assert_ok!(client.poll("/images/text2img/7").await);

    assert_eq!(result.output, vec!["http://img/7.png".to_string()]);
    assert_eq!(result.job_id(), Some("7"));
}
