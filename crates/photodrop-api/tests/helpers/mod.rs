//! Test helpers: build the application over a temp-dir store for integration tests.
//!
//! Run from workspace root: `cargo test -p photodrop-api`.

#![allow(dead_code)]

pub mod fixtures;

use axum::http::Method;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use photodrop_api::setup;
use photodrop_api::state::AppState;
use photodrop_core::Config;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub storage_path: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Names of every file currently in the storage directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.storage_path)
            .expect("Failed to read storage directory")
            .map(|entry| {
                entry
                    .expect("Failed to read directory entry")
                    .file_name()
                    .to_string_lossy()
                    .to_string()
            })
            .collect();
        names.sort();
        names
    }
}

/// Setup test app with local storage in a fresh temp directory.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

/// Setup test app with extra configuration variables.
pub async fn setup_test_app_with(vars: &[(&str, &str)]) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_path = temp_dir.path().join("photos");

    let mut env: HashMap<String, String> = HashMap::new();
    env.insert("STORAGE_BACKEND".to_string(), "local".to_string());
    env.insert(
        "STORAGE_PATH".to_string(),
        storage_path.to_string_lossy().to_string(),
    );
    for (key, value) in vars {
        env.insert(key.to_string(), value.to_string());
    }

    let config = Config::from_lookup(|key| env.get(key).cloned()).expect("Invalid test config");
    let (state, router) = setup::initialize_app(config)
        .await
        .expect("Failed to initialize app");

    let server = TestServer::new(router.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        storage_path,
        _temp_dir: temp_dir,
    }
}

/// POST `data` as `filename` in the `image` field.
pub async fn upload(client: &TestServer, filename: &str, data: Vec<u8>) -> TestResponse {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(filename.to_string())
        .mime_type("application/octet-stream");
    client
        .post("/upload")
        .multipart(MultipartForm::new().add_part("image", part))
        .await
}

/// Upload and return the generated object name, asserting success.
pub async fn upload_ok(client: &TestServer, filename: &str, data: Vec<u8>) -> String {
    let response = upload(client, filename, data).await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    body["filename"]
        .as_str()
        .expect("Expected 'filename' in upload response")
        .to_string()
}

pub async fn download(client: &TestServer, name: &str) -> TestResponse {
    client.get(&format!("/download/{}", name)).await
}

pub async fn head(client: &TestServer, name: &str) -> TestResponse {
    client
        .method(Method::HEAD, &format!("/download/{}", name))
        .await
}
