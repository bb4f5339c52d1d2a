use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION};
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use rstest::*;
use serde_json::json;
use tower::ServiceExt;

use super::{error_body, send, send_raw};
use crate::core::client::storage::{MockStorageClient, StorageError};
use crate::server::route::server_router;
use crate::tests::common::{InMemoryDatabase, RecordingQueue};
use crate::tests::config::TestConfigBuilder;

#[rstest]
#[tokio::test]
async fn health_reports_uptime() {
    let services = TestConfigBuilder::new().build();

    let (status, body) = send(services.config.clone(), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["uptime_s"].is_u64());
}

#[rstest]
#[tokio::test]
async fn readiness_lists_failing_dependencies() {
    let mut storage = MockStorageClient::new();
    storage.expect_health_check().returning(|| {
        Err(StorageError::ObjectStreamError { key: "health".to_string(), message: "bucket missing".to_string() })
    });
    let services = TestConfigBuilder::new()
        .mock_db_client(InMemoryDatabase::default().mock())
        .mock_queue(RecordingQueue::default().mock())
        .mock_storage_client(storage)
        .build();

    let (status, body) = send(services.config.clone(), Method::GET, "/health/ready", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "status": "unavailable", "failing": ["storage"] }));
}

#[rstest]
#[tokio::test]
async fn readiness_is_ok_when_everything_answers() {
    let mut storage = MockStorageClient::new();
    storage.expect_health_check().returning(|| Ok(()));
    let services = TestConfigBuilder::new()
        .mock_db_client(InMemoryDatabase::default().mock())
        .mock_queue(RecordingQueue::default().mock())
        .mock_storage_client(storage)
        .build();

    let (status, body) = send(services.config.clone(), Method::GET, "/health/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[rstest]
#[tokio::test]
async fn unknown_routes_are_json_404s_with_security_headers() {
    let services = TestConfigBuilder::new().build();

    let (status, headers, body) = send_raw(services.config.clone(), Method::GET, "/v2/nothing", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error_body("The requested resource was not found"));
    assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[X_XSS_PROTECTION], "1; mode=block");
}

#[rstest]
#[case("/v1/templates", None)]
#[case("/v1/templates?show=true", Some(true))]
#[case("/v1/templates?show=false", Some(false))]
#[tokio::test]
async fn templates_can_be_filtered_on_visibility(#[case] uri: &str, #[case] show: Option<bool>) {
    let services = TestConfigBuilder::new().build();

    let (status, body) = send(services.config.clone(), Method::GET, uri, None).await;

    assert_eq!(status, StatusCode::OK);
    let templates = body["templates"].as_array().unwrap();
    assert!(!templates.is_empty());
    if let Some(show) = show {
        assert!(templates.iter().all(|template| template["show"] == show));
    } else {
        assert!(templates.iter().any(|template| template["name"] == "rangeCheck"));
        assert!(templates.iter().any(|template| template["show"] == false));
    }
}

#[rstest]
#[tokio::test]
async fn metrics_are_exposed_in_prometheus_text_format() {
    let services = TestConfigBuilder::new().build();
    let request = Request::builder().method(Method::GET).uri("/metrics").body(Body::empty()).unwrap();

    let response = server_router(services.config.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
    assert_eq!(response.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(body.to_vec()).unwrap();
    if cfg!(target_os = "linux") {
        assert!(body.contains("process_cpu_seconds_total"));
    }
}
