//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, route table)
//!     → /healthz | /static/* | everything else
//!     → request.rs (request ID, InboundRequest snapshot)
//!     → routing planner decides
//!     → response.rs (307 redirect or 404 page)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{X_FRONTEND_URL, X_REQUEST_ID};
pub use response::NotFoundPage;
pub use server::{HttpServer, ServerError};
