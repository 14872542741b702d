//! API module
//!
//! HTTP API endpoints and middleware.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{PasswordHasher, TokenAuthority};
use crate::store::Storage;

pub mod extract;
pub mod middleware;
pub mod routes;

pub use routes::create_router;

/// Shared state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub tokens: TokenAuthority,
    pub passwords: PasswordHasher,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, tokens: TokenAuthority, passwords: PasswordHasher) -> Self {
        Self {
            store,
            tokens,
            passwords,
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Layers run last-added first: context -> logging -> (auth) -> handler
    let api_router = create_router(state.clone())
        .layer(axum::middleware::from_fn(self::middleware::logging_middleware))
        .layer(axum::middleware::from_fn(self::middleware::context_middleware));

    Router::new()
        // Health check (no auth)
        .route("/health", get(health_check))
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
