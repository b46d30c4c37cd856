//! Middleware for the REST API server.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

/// Create CORS middleware.
///
/// Memos are shared by link, so any origin may call the API.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Request logging middleware.
///
/// Server errors are logged at warn level; health probes only at debug.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        warn!(%method, %path, status, duration_ms, "Request failed");
    } else if path == "/health" {
        debug!(%method, %path, status, duration_ms, "Health check");
    } else {
        info!(%method, %path, status, duration_ms, "Request completed");
    }

    response
}
