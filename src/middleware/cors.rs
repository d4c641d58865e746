use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
}

/// Restricts to `origin` when configured, otherwise permissive.
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return permissive_cors();
    };
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(value),
        Err(_) => {
            tracing::warn!(%origin, "invalid CORS_ALLOWED_ORIGIN, falling back to permissive CORS");
            permissive_cors()
        }
    }
}
