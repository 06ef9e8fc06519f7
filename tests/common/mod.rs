#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

use komik::config::Config;
use komik::db::KomikStorage;
use komik::router::{KomikState, komik_router};

pub const OWNER_EMAIL: &str = "owner@example.com";
pub const OWNER_PASSWORD: &str = "owner-password";

/// Router over a throwaway SQLite file, removed on drop.
pub struct TestApp {
    pub app: Router,
    pub storage: KomikStorage,
    db_path: PathBuf,
    upload_dir: PathBuf,
}

fn unique_path(label: &str, suffix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "komik-{label}-{}-{nanos}{suffix}",
        std::process::id()
    ));
    path
}

/// Defaults with rate limiting off and a fixed signing secret.
pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.auth.jwt_secret = "test-secret".to_string();
    cfg.rate_limit.enabled = false;
    cfg
}

impl TestApp {
    pub async fn spawn(label: &str) -> Self {
        Self::with_config(label, test_config()).await
    }

    pub async fn with_config(label: &str, mut cfg: Config) -> Self {
        let db_path = unique_path(label, ".sqlite");
        let upload_dir = unique_path(label, "-uploads");
        cfg.basic.upload_dir = upload_dir.clone();

        let database_url = format!("sqlite:{}", db_path.display());
        let storage = KomikStorage::connect(&database_url)
            .await
            .expect("failed to open test database");
        let state = KomikState::new(storage.clone(), Arc::new(cfg));
        Self {
            app: komik_router(state),
            storage,
            db_path,
            upload_dir,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = self
            .app
            .clone()
            .oneshot(builder.body(body).expect("failed to build request"))
            .await
            .expect("request failed");

        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("DELETE", uri, token, None).await
    }

    /// Register a MEMBER and return its access token.
    pub async fn register(&self, email: &str, username: &str) -> String {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                serde_json::json!({"email": email, "username": username, "password": "member-password"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["accessToken"].as_str().expect("token").to_string()
    }

    /// Create the owner through the installer and log in.
    pub async fn owner_token(&self) -> String {
        let (status, body) = self
            .post(
                "/install/create-owner",
                None,
                serde_json::json!({"email": OWNER_EMAIL, "username": "owner", "password": OWNER_PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true, "create-owner failed: {body}");

        let (status, body) = self
            .post(
                "/auth/login",
                None,
                serde_json::json!({"email": OWNER_EMAIL, "password": OWNER_PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "owner login failed: {body}");
        body["accessToken"].as_str().expect("token").to_string()
    }
}

/// Pause between polls of counters that are bumped in the background.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.db_path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}
