//! Request middleware for body limits and request logging

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, warn};

/// Reject bodies larger than `max_bytes` with 413
pub fn body_limit(max_bytes: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(max_bytes)
}

/// Log method, path, status and latency of every request
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        warn!("{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed_ms);
    } else {
        debug!("{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed_ms);
    }

    response
}
