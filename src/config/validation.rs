//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, socket addresses and value ranges
//! - Check the selected lookup backend has a connection target
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BackendConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{BackendConfig, LookupBackend};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("{field} is not an absolute URL with a host: '{value}'")]
    Url { field: &'static str, value: String },

    #[error("vice_domain must not be empty")]
    EmptyDomain,

    #[error("--ssl-cert is required with --ssl-key")]
    MissingCert,

    #[error("--ssl-key is required with --ssl-cert")]
    MissingKey,

    #[error("lookup.database_url is required for the sql backend")]
    MissingDatabaseUrl,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a configuration, collecting every failure.
pub fn validate_config(config: &BackendConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::MissingCert);
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::MissingKey);
        }
    }

    let routing = &config.routing;
    check_url(&mut errors, "routing.base_url", &routing.base_url);
    check_url(&mut errors, "routing.landing_page_url", &routing.landing_page_url);
    check_url(&mut errors, "routing.loading_page_url", &routing.loading_page_url);

    if routing.vice_domain.trim().is_empty() {
        errors.push(ValidationError::EmptyDomain);
    }

    match config.lookup.backend {
        LookupBackend::Graphql => {
            check_url(&mut errors, "lookup.graphql_url", &config.lookup.graphql_url);
        }
        LookupBackend::Sql => {
            if config.lookup.database_url.as_deref().map_or(true, str::is_empty) {
                errors.push(ValidationError::MissingDatabaseUrl);
            }
            if config.lookup.max_connections == 0 {
                errors.push(ValidationError::Zero("lookup.max_connections"));
            }
        }
    }

    if config.lookup.timeout_secs == 0 {
        errors.push(ValidationError::Zero("lookup.timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let ok = Url::parse(value)
        .map(|u| u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::Url {
            field,
            value: value.to_string(),
        });
    }
}
