use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe. Does not touch the database.
#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
    }))
}
