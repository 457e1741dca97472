//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Authentication middleware backed by the sessions table
//! - Error to JSON response mapping

pub mod error;
pub mod middleware;
pub mod routes;

use axum::{Router, extract::DefaultBodyLimit};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use firecert_core::storage::StorageService;
use firecert_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Storage service for documents and inspection photos (optional).
    pub storage: Option<Arc<StorageService>>,
}

/// Creates the main application router.
///
/// `body_limit` caps request bodies, multipart uploads included.
pub fn create_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
