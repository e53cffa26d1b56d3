//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Balance and transaction history routes backed by the cached views
//! - Readiness and ledger reader health checks
//! - JSON error responses

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use ledgerview_core::reader::ReaderHealth;
use ledgerview_core::views::{BalanceView, HistoryView};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached balances.
    pub balances: Arc<BalanceView>,
    /// Cached transaction histories.
    pub history: Arc<HistoryView>,
    /// Health of the background ledger reader.
    pub reader_health: ReaderHealth,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
