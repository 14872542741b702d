//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use finance_tracker::api::{self, AppState};
use finance_tracker::auth::{PasswordHasher, TokenAuthority};
use finance_tracker::store::JsonFileStore;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router over a fresh JSON file store. Keep the `TempDir` alive for the
/// duration of the test.
pub struct TestApp {
    pub router: Router,
    pub tokens: TokenAuthority,
    pub store: Arc<JsonFileStore>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            JsonFileStore::open(dir.path().join("data.json"))
                .await
                .expect("Failed to open store"),
        );
        let tokens = TokenAuthority::new(TEST_SECRET, 7);
        let passwords = PasswordHasher::new(4).expect("Failed to build hasher");

        let state = AppState::new(store.clone(), tokens.clone(), passwords);

        Self {
            router: api::build_router(state),
            tokens,
            store,
            _dir: dir,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a request and decode the JSON response body
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, token, body).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Sign up and return the session token
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> String {
        let (status, body) = self
            .json(
                "POST",
                "/api/signup",
                None,
                Some(serde_json::json!({ "name": name, "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }
}

/// Connect to the database named by `DATABASE_URL` and empty the tables.
/// Returns `None` when no database is configured.
pub async fn setup_test_db() -> Option<finance_tracker::store::PgStore> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let store = finance_tracker::store::PgStore::connect(&database_url, 5)
        .await
        .expect("Failed to connect to DB");

    sqlx::query("TRUNCATE TABLE expenses, users CASCADE")
        .execute(store.pool())
        .await
        .expect("Failed to clean up DB");

    Some(store)
}
