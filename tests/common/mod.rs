//! Test helpers for Web API integration tests.
//!
//! Builds the full application router over an in-memory database and a
//! local blob store rooted in a temporary directory.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;

use mediabox::{Config, Database, LocalBlobStore, WebServer};

/// JWT secret used by every test server.
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-testing-only";

/// Password used by the signup helpers.
pub const TEST_PASSWORD: &str = "password123";

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub store: Arc<LocalBlobStore>,
    _blob_dir: TempDir,
}

/// Create a test configuration rooted at `blob_dir`.
pub fn create_test_config(blob_dir: &TempDir, max_upload_size_mb: u64) -> Config {
    let mut config = Config::default();
    config.web.host = "127.0.0.1".to_string();
    config.web.port = 0;
    config.web.jwt_secret = TEST_JWT_SECRET.to_string();
    config.web.jwt_expiry_secs = 900;
    config.storage.local_path = blob_dir.path().to_string_lossy().into_owned();
    config.storage.local_base_url = "http://localhost:8080/blobs".to_string();
    config.media.max_upload_size_mb = max_upload_size_mb;
    config
}

/// Create a test application with the default upload ceiling.
pub async fn create_test_app() -> TestApp {
    create_test_app_with_limit(10).await
}

/// Create a test application with a custom upload ceiling in megabytes.
pub async fn create_test_app_with_limit(max_upload_size_mb: u64) -> TestApp {
    let blob_dir = tempfile::tempdir().expect("Failed to create blob directory");
    let config = create_test_config(&blob_dir, max_upload_size_mb);

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let store = Arc::new(
        LocalBlobStore::new(blob_dir.path(), &config.storage.local_base_url)
            .expect("Failed to create blob store"),
    );

    let server = WebServer::new(&config, db.clone(), store.clone())
        .expect("Failed to create web server");
    let server = TestServer::new(server.into_router()).expect("Failed to create test server");

    TestApp {
        server,
        db,
        store,
        _blob_dir: blob_dir,
    }
}

/// Format a bearer authorization header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Sign up a user and return the raw response.
pub async fn signup(server: &TestServer, username: &str, email: &str, password: &str) -> TestResponse {
    server
        .post("/api/auth/signup")
        .json(&json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .await
}

/// Sign up a user and return its token.
pub async fn signup_token(server: &TestServer, username: &str) -> String {
    let response = signup(
        server,
        username,
        &format!("{}@example.com", username),
        TEST_PASSWORD,
    )
    .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// A fake JPEG payload of `len` bytes.
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.resize(len.max(4), 0x42);
    bytes
}

/// A fake MP4 payload of `len` bytes.
pub fn mp4_bytes(len: usize) -> Vec<u8> {
    let mut bytes = b"\x00\x00\x00\x18ftypmp42".to_vec();
    bytes.resize(len.max(12), 0x17);
    bytes
}

/// Build a multipart form with a single file part.
pub fn file_form(content: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(content)
            .file_name(file_name)
            .mime_type(mime_type),
    )
}

/// Upload a file and return the raw response.
pub async fn upload(server: &TestServer, token: &str, form: MultipartForm) -> TestResponse {
    server
        .post("/api/media/upload")
        .add_header(AUTHORIZATION, bearer(token))
        .multipart(form)
        .await
}

/// Upload a JPEG and return the created media JSON.
pub async fn upload_jpeg(server: &TestServer, token: &str, file_name: &str, len: usize) -> Value {
    let response = upload(server, token, file_form(jpeg_bytes(len), file_name, "image/jpeg")).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["media"].clone()
}
