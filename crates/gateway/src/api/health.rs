//! Liveness and relay introspection.

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "provider": state.assistants.provider_id(),
        "in_flight": state.relays.in_flight(),
    }))
}

/// `GET /v1/relays`: in-flight relays, oldest first.
pub async fn list_relays(State(state): State<AppState>) -> impl IntoResponse {
    let relays = state.relays.list();
    Json(serde_json::json!({
        "count": relays.len(),
        "relays": relays,
    }))
}
