//! Router harness for handler tests: in-memory store, scripted vision model
//! and a throwaway upload directory.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use menuscan_core::{Restaurant, Role, User};
use menuscan_extraction::MenuExtractor;
use menuscan_media::ImageStore;
use menuscan_security::TokenKeys;
use menuscan_store::{SqliteStore, UserStore};
use menuscan_understanding::ScriptedVisionClient;

use crate::server::{GatewayState, build_router};

pub const BOUNDARY: &str = "menuscan-test-boundary";

pub const JOES_OUTPUT: &str = "Sure! {\"restaurant_name\":\"Joe's\",\"menu\":[{\"category\":\"Mains\",\"items\":[{\"id\":1,\"name\":\"Burger\",\"price\":9.5,\"is_vegetarian\":false}]}]}";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteStore>,
    pub keys: TokenKeys,
    pub vision: Arc<ScriptedVisionClient>,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn new(vision: ScriptedVisionClient) -> Self {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let keys = TokenKeys::new("test-secret", 30);
        let vision = Arc::new(vision);
        let uploads = tempfile::tempdir().unwrap();
        let state = GatewayState::new(
            store.clone(),
            MenuExtractor::new(vision.clone()),
            keys.clone(),
            ImageStore::new(uploads.path()),
        );
        Self {
            router: build_router(state),
            store,
            keys,
            vision,
            uploads,
        }
    }

    /// Insert a user directly and return it with a valid bearer token.
    pub async fn user(&self, email: &str, restaurants: &[&str], role: Role) -> (User, String) {
        let restaurants = restaurants
            .iter()
            .map(|name| Restaurant {
                name: name.to_string(),
                description: String::new(),
                location: String::new(),
            })
            .collect();
        let mut user = User::new("Test User", email, "unused-hash", restaurants);
        user.role = role;
        self.store.insert_user(&user).await.unwrap();
        let token = self.keys.issue(user.id).unwrap();
        (user, token)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// A multipart upload with an optional restaurant name and
/// `(filename, content type, bytes)` image parts.
pub fn upload_request(
    method: &str,
    uri: &str,
    token: &str,
    restaurant_name: Option<&str>,
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(name) = restaurant_name {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"restaurant_name\"\r\n\r\n{name}\r\n"
            )
            .as_bytes(),
        );
    }
    for (filename, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
