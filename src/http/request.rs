//! Request-side helpers.
//!
//! # Responsibilities
//! - Name the headers the default backend reads or sets
//! - Read the request ID set by the request-id layer
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The planner consumes an `InboundRequest` snapshot, never the live request

use axum::http::{HeaderName, Request};

/// Request correlation header.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Original client URL as seen by the front-end ingress.
pub const X_FRONTEND_URL: HeaderName = HeaderName::from_static("x-frontend-url");

/// Request ID assigned by the middleware stack, or "unknown".
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
