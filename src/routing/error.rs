//! Failures a routing decision can end in.

use axum::http::StatusCode;
use thiserror::Error;

use crate::lookup::LookupError;

/// Terminal error outcome for a request.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Malformed configured URL or unparsable `X-Frontend-Url`.
    #[error("error checking URL {address}: {reason}")]
    AddressResolution { address: String, reason: String },

    /// Resolved host is outside the configured parent domain.
    #[error("URL {host} is not in the domain of {domain}")]
    DomainMismatch { host: String, domain: String },

    /// The existence lookup failed; distinct from a definitive miss.
    #[error("error looking up subdomain '{subdomain}': {source}")]
    Lookup {
        subdomain: String,
        #[source]
        source: LookupError,
    },
}

impl RoutingError {
    pub(crate) fn resolution(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::AddressResolution {
            address: address.into(),
            reason: reason.to_string(),
        }
    }

    /// HTTP status the error is surfaced as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RoutingError::DomainMismatch { .. } => StatusCode::BAD_REQUEST,
            RoutingError::AddressResolution { .. } | RoutingError::Lookup { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            RoutingError::AddressResolution { .. } => "address_error",
            RoutingError::DomainMismatch { .. } => "domain_mismatch",
            RoutingError::Lookup { .. } => "lookup_error",
        }
    }
}
