//! Default backend for VICE app ingress.
//!
//! Requests that no dedicated service claims land here. Each one is
//! classified by the subdomain it was addressed to and answered with a
//! redirect to the loading page (the app exists), a redirect to the landing
//! page (no subdomain), or the local 404 page (no such app).

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod lookup;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::BackendConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{RedirectPlanner, RoutingOutcome};
