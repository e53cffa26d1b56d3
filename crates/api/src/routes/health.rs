//! Readiness and health check endpoints.

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::AppState;

/// Readiness: the server is accepting connections.
async fn ready() -> &'static str {
    "ok"
}

/// Health of the ledger reader: `ok` while its last poll succeeded.
async fn healthy(State(state): State<AppState>) -> (StatusCode, String) {
    let status = state.reader_health.check();
    let code = StatusCode::from_u16(status.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, status.message)
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ready", get(ready))
        .route("/healthy", get(healthy))
}
