//! Test application wired against a temporary directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use storyadmin::{AdminSettings, RemoteSettings};
use storyadmin_server::{build_router, AppState};

pub const BOUNDARY: &str = "storyadmin-test-boundary";

pub struct TestApp {
    temp_dir: TempDir,
    pub state: AppState,
    pub config_path: PathBuf,
    pub fallback_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub public_dir: PathBuf,
    pub remote_dir: PathBuf,
}

impl TestApp {
    /// No publish remote configured; the store is not loaded.
    pub fn new() -> Self {
        Self::build(|_| RemoteSettings::default())
    }

    /// Publishes to a local bare repository.
    pub fn with_remote() -> Self {
        Self::build(|remote_dir| {
            Command::new("git")
                .args(["init", "--bare", "--quiet"])
                .arg(remote_dir)
                .status()
                .expect("git should be installed");
            RemoteSettings {
                remote_url: Some(remote_dir.to_string_lossy().into_owned()),
                timeout_secs: Some(60),
                ..RemoteSettings::default()
            }
        })
    }

    fn build(remote: impl FnOnce(&Path) -> RemoteSettings) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let config_path = base.join("admin").join("story_remote.json");
        let fallback_path = base.join("story_remote.json");
        let uploads_dir = base.join("admin").join("uploads");
        let public_dir = base.join("admin").join("public");
        let remote_dir = base.join("remote.git");
        std::fs::create_dir_all(&public_dir).unwrap();

        let settings = AdminSettings {
            config_path: config_path.clone(),
            fallback_config_path: fallback_path.clone(),
            uploads_dir: uploads_dir.clone(),
            public_dir: public_dir.clone(),
            staging_dir: base.join("admin").join("temp"),
            remote: remote(&remote_dir),
            ..AdminSettings::default()
        };

        Self {
            state: AppState::from_settings(settings),
            temp_dir,
            config_path,
            fallback_path,
            uploads_dir,
            public_dir,
            remote_dir,
        }
    }

    /// Writes `document` as the bootstrap copy and loads the store.
    pub async fn load(&self, document: &Value) {
        std::fs::write(&self.fallback_path, serde_json::to_vec(document).unwrap()).unwrap();
        self.state.store.load().await.expect("store should load");
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Sends one request through a fresh router.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    /// Serves the router on an ephemeral port and returns its base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let app = self.router();
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
        format!("http://{}", address)
    }

    pub fn uploaded_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.uploads_dir)
            .map(|entries| {
                entries
                    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// A `multipart/form-data` request with an optional `file` part and
/// optional `category` field.
pub fn post_upload(file: Option<(&str, &[u8])>, category: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some((filename, content)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(category) = category {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\n{}\r\n",
                BOUNDARY, category
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
