use axum_test::TestServer;
use pixbin_api::setup::setup_routes;
use pixbin_api::AppState;
use pixbin_core::{Config, StorageBackend};
use tempfile::TempDir;

/// Build a config backed by a temp directory for local storage.
///
/// Verification is off and trusted_proxy_count is zero so tests can pick
/// their client identity with a plain x-forwarded-for header.
pub fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        storage_backend: StorageBackend::Local,
        local_storage_path: temp_dir.path().to_string_lossy().to_string(),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        max_file_size_bytes: 10 * 1024 * 1024,
        allowed_content_types: vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
            "image/webp".to_string(),
            "image/gif".to_string(),
        ],
        object_key_length: 8,
        strict_uploads: false,
        rate_limit_max_attempts: 100,
        rate_limit_window_seconds: 60,
        turnstile_secret: None,
        turnstile_verify_url: "http://127.0.0.1:1/siteverify".to_string(),
        turnstile_timeout_seconds: 1,
        trusted_proxy_count: 0,
    }
}

/// Spin up an in-process test server over the full router.
pub async fn test_server(config: Config) -> TestServer {
    let state = AppState::initialize(config)
        .await
        .expect("Failed to initialize test state");
    let app = setup_routes(state);
    TestServer::new(app).expect("Failed to start test server")
}

/// Minimal valid 1x1 PNG payload.
pub fn png_bytes() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 dimensions
        0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49,
        0x44, 0x41, 0x54, // IDAT chunk
        0x08, 0xD7, 0x63, 0xF8, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD,
        0x8D, 0x89, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60,
        0x82, // IEND chunk
    ]
}
