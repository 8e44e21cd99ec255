mod helpers;

use axum::http::Method;
use helpers::{test_config, test_server};
use serde_json::Value;

#[tokio::test]
async fn test_get_missing_object_returns_404() {
    let temp_dir = tempfile::tempdir().unwrap();
    let server = test_server(test_config(&temp_dir)).await;

    let response = server.get("/i/zzzzzzzz.png").await;
    assert_eq!(response.status_code(), 404);

    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_get_traversal_key_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let server = test_server(test_config(&temp_dir)).await;

    let response = server.get("/i/..%2fsecret.png").await;
    // Either the router or key validation refuses it; never a 200.
    assert_ne!(response.status_code(), 200);
}

#[tokio::test]
async fn test_counter_counts_unique_clients() {
    let temp_dir = tempfile::tempdir().unwrap();
    let server = test_server(test_config(&temp_dir)).await;

    let response = server
        .get("/counter")
        .add_header("x-forwarded-for", "203.0.113.1")
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["unique"], 1);

    // Same client again: total unchanged.
    let body: Value = server
        .get("/counter")
        .add_header("x-forwarded-for", "203.0.113.1")
        .await
        .json();
    assert_eq!(body["total"], 1);

    // New client bumps the total.
    let body: Value = server
        .get("/counter")
        .add_header("x-forwarded-for", "203.0.113.2")
        .await
        .json();
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_health_endpoint() {
    let temp_dir = tempfile::tempdir().unwrap();
    let server = test_server(test_config(&temp_dir)).await;

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_cors_preflight() {
    let temp_dir = tempfile::tempdir().unwrap();
    let server = test_server(test_config(&temp_dir)).await;

    let response = server
        .method(Method::OPTIONS, "/upload")
        .add_header("origin", "https://example.com")
        .add_header("access-control-request-method", "POST")
        .await;

    assert!(response.status_code().is_success());
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_some());
}

#[tokio::test]
async fn test_openapi_document_served() {
    let temp_dir = tempfile::tempdir().unwrap();
    let server = test_server(test_config(&temp_dir)).await;

    let response = server.get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert!(body["paths"]["/upload"].is_object());
    assert!(body["paths"]["/i/{key}"].is_object());
}
