//! Logging middleware
//!
//! Request tracing and the request timeout applied to the whole router.

use std::time::Duration;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Wrap `router` with request tracing and a per-request timeout
pub fn with_http_layers(router: Router, request_timeout: Duration) -> Router {
    router.layer(TimeoutLayer::new(request_timeout)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}
