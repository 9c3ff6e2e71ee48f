//! Health check handlers.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use crate::state::AppState;

/// Liveness check.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness check: the Storefront API must answer the shop query.
#[instrument(skip(state))]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.storefront().shop_name().await {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
