//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve `/healthz` and `/static/*` independently of the planner
//! - Dispatch every other request to the redirect planner
//! - Bind server to a plain or TLS listener with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::BackendConfig;
use crate::http::request::request_id;
use crate::http::response::{render_outcome, NotFoundPage};
use crate::lookup::{lookup_from_config, ExistenceLookup, LookupError};
use crate::observability::metrics;
use crate::routing::{InboundRequest, RedirectPlanner, RoutingError};

/// Body returned by the health endpoint.
pub const HEALTHY_BODY: &str = "I'm healthy.";

/// Grace period for in-flight requests on TLS shutdown.
const TLS_DRAIN: Duration = Duration::from_secs(10);

/// Errors building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("routing configuration: {0}")]
    Routing(#[from] RoutingError),

    #[error("lookup configuration: {0}")]
    Lookup(#[from] LookupError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<RedirectPlanner>,
    pub not_found: Arc<NotFoundPage>,
    /// Whether this listener terminates TLS.
    pub tls: bool,
}

/// HTTP server for the default backend.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server using the lookup backend named in the configuration.
    pub fn new(config: BackendConfig) -> Result<Self, ServerError> {
        let lookup = lookup_from_config(&config.lookup)?;
        Self::with_lookup(config, lookup)
    }

    /// Create a server with an explicit existence lookup.
    pub fn with_lookup(
        config: BackendConfig,
        lookup: Arc<dyn ExistenceLookup>,
    ) -> Result<Self, ServerError> {
        let planner = RedirectPlanner::from_config(&config.routing, lookup)?;
        tracing::debug!(planner = ?planner, "Redirect planner ready");

        let state = AppState {
            planner: Arc::new(planner),
            not_found: Arc::new(NotFoundPage::new(
                &config.static_files.path,
                config.routing.not_found,
            )),
            tls: config.listener.tls.is_some(),
        };

        Ok(Self {
            router: Self::build_router(&config, state),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &BackendConfig, state: AppState) -> Router {
        Router::new()
            .route("/healthz", any(healthz))
            .route("/healthz/{*rest}", any(healthz))
            .nest_service("/static", ServeDir::new(&config.static_files.path))
            .fallback(route_request)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// A clone of the route table, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve plain HTTP until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = false, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, tls = true, "HTTP server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(TLS_DRAIN));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn healthz() -> &'static str {
    HEALTHY_BODY
}

/// Classify the request and redirect, 404, or fail.
async fn route_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id(&request);
    let inbound = InboundRequest::from_http(&request, state.tls);
    let host = inbound.host.clone().unwrap_or_default();

    let decision = state.planner.decide(&inbound).await;
    let subdomain = decision.subdomain;

    match decision.result {
        Ok(outcome) => {
            metrics::record_outcome(outcome.label());
            tracing::info!(
                request_id = %request_id,
                host = %host,
                subdomain = %subdomain,
                path = %inbound.path,
                outcome = outcome.label(),
                "Request routed"
            );
            render_outcome(outcome, &state.planner, &state.not_found).await
        }
        Err(e) => {
            metrics::record_outcome(e.label());
            match &e {
                RoutingError::DomainMismatch { .. } => {
                    tracing::warn!(request_id = %request_id, host = %host, subdomain = %subdomain, error = %e, "Address outside domain");
                }
                RoutingError::Lookup { source, .. } => {
                    tracing::error!(
                        request_id = %request_id,
                        host = %host,
                        subdomain = %subdomain,
                        error = %source,
                        "Subdomain lookup failed"
                    );
                }
                RoutingError::AddressResolution { .. } => {
                    tracing::error!(request_id = %request_id, host = %host, subdomain = %subdomain, error = %e, "Address resolution failed");
                }
            }
            e.into_response()
        }
    }
}
