pub mod health;
pub mod threads;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the API router. State is attached by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Relay entry point (bare path kept for existing callers)
        .route("/threads", post(threads::create))
        .route("/v1/threads", post(threads::create))
        // Introspection
        .route("/v1/relays", get(health::list_relays))
}
