//! Address resolution.
//!
//! # Responsibilities
//! - Work out the URL the client originally asked for
//! - Two strategies: trust the `X-Frontend-Url` header set by the ingress,
//!   or rebuild the URL from the request's own Host, TLS state, path and query
//!
//! # Design Decisions
//! - Pure functions of request state; no I/O
//! - A missing header or Host is an empty address, not an error
//! - The header is split, not normalized: host case and path segments are
//!   kept as sent

use std::fmt;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Request, Uri};

use crate::config::RoutingConfig;
use crate::http::request::X_FRONTEND_URL;
use crate::routing::error::RoutingError;

/// The inputs resolution may consult, captured from an inbound request.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Host header (or URI authority for HTTP/2).
    pub host: Option<String>,
    /// Whether the request arrived over TLS.
    pub tls: bool,
    pub path: String,
    pub raw_query: Option<String>,
    /// Raw `X-Frontend-Url` header.
    pub frontend_url: Option<HeaderValue>,
}

impl InboundRequest {
    pub fn from_http<B>(request: &Request<B>, tls: bool) -> Self {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| request.uri().authority().map(|a| a.to_string()));

        Self {
            host,
            tls,
            path: request.uri().path().to_string(),
            raw_query: request.uri().query().map(str::to_string),
            frontend_url: request.headers().get(X_FRONTEND_URL).cloned(),
        }
    }
}

/// Externally visible URL of a request, split into the parts routing needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub scheme: String,
    /// `host[:port]`
    pub host: String,
    pub path: String,
    pub raw_query: Option<String>,
}

impl ResolvedAddress {
    /// True when there is no host to route on.
    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }

    /// Split an absolute URI without normalizing it. Userinfo is dropped.
    fn from_uri(raw: &str) -> Result<Self, RoutingError> {
        let uri: Uri = raw.parse().map_err(|e| RoutingError::resolution(raw, e))?;
        let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) else {
            return Err(RoutingError::resolution(raw, "not an absolute URL"));
        };
        let host = match authority.port() {
            Some(port) => format!("{}:{}", authority.host(), port.as_str()),
            None => authority.host().to_string(),
        };
        Ok(Self {
            scheme: scheme.to_string(),
            host,
            path: uri.path().to_string(),
            raw_query: uri.query().map(str::to_string),
        })
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)?;
        if let Some(query) = &self.raw_query {
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

/// Strategy for recovering the client's original address.
pub trait AddressResolver: Send + Sync + fmt::Debug {
    fn resolve(&self, request: &InboundRequest) -> Result<ResolvedAddress, RoutingError>;
}

/// Trusts the `X-Frontend-Url` header set by the front-end ingress.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontendHeaderResolver;

impl AddressResolver for FrontendHeaderResolver {
    fn resolve(&self, request: &InboundRequest) -> Result<ResolvedAddress, RoutingError> {
        let Some(value) = &request.frontend_url else {
            return Ok(ResolvedAddress::default());
        };
        let raw = value
            .to_str()
            .map_err(|e| RoutingError::resolution(String::from_utf8_lossy(value.as_bytes()), e))?;
        if raw.is_empty() {
            return Ok(ResolvedAddress::default());
        }

        ResolvedAddress::from_uri(raw)
    }
}

/// Rebuilds the address from the transport-level Host header.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostHeaderResolver;

impl AddressResolver for HostHeaderResolver {
    fn resolve(&self, request: &InboundRequest) -> Result<ResolvedAddress, RoutingError> {
        let scheme = if request.tls { "https" } else { "http" };
        Ok(ResolvedAddress {
            scheme: scheme.to_string(),
            host: request.host.clone().unwrap_or_default(),
            path: request.path.clone(),
            raw_query: request.raw_query.clone(),
        })
    }
}

/// Pick the strategy the configuration asks for.
pub fn resolver_for(config: &RoutingConfig) -> Arc<dyn AddressResolver> {
    if config.disable_custom_header_match {
        Arc::new(HostHeaderResolver)
    } else {
        Arc::new(FrontendHeaderResolver)
    }
}
