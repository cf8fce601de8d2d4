//! Existence lookup subsystem.
//!
//! # Data Flow
//! ```text
//! RedirectPlanner
//!     → ExistenceLookup::exists(subdomain)
//!         → graphql.rs (jobs(where: {subdomain: {_eq: $subdomain}}) { id })
//!         → sql.rs     (select id from jobs where subdomain = $1 limit 1)
//!     → Ok(true) | Ok(false) | Err(LookupError)
//! ```
//!
//! # Design Decisions
//! - The planner only sees the trait; the backend is chosen at startup
//! - Zero matching jobs is `Ok(false)`, never an error
//! - Deadlines belong to each backend's client, not the planner
//! - Subdomains are passed through exactly as extracted

pub mod graphql;
pub mod sql;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{LookupBackend, LookupConfig};

pub use graphql::GraphqlLookup;
pub use sql::SqlLookup;

/// Errors from an existence backend.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request to lookup service failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("lookup service returned status {0}")]
    Status(u16),

    #[error("graphql: {0}")]
    Query(String),

    #[error("missing {field} from lookup response for '{subdomain}' subdomain")]
    MissingField {
        field: &'static str,
        subdomain: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("lookup backend misconfigured: {0}")]
    Config(String),
}

/// Answers whether a live workload owns a subdomain.
#[async_trait]
pub trait ExistenceLookup: Send + Sync {
    async fn exists(&self, subdomain: &str) -> Result<bool, LookupError>;

    /// Backend name for logs and metrics.
    fn name(&self) -> &'static str;
}

/// Build the configured backend.
pub fn lookup_from_config(config: &LookupConfig) -> Result<Arc<dyn ExistenceLookup>, LookupError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.backend {
        LookupBackend::Graphql => Ok(Arc::new(GraphqlLookup::new(&config.graphql_url, timeout)?)),
        LookupBackend::Sql => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| LookupError::Config("database_url is not set".to_string()))?;
            Ok(Arc::new(SqlLookup::connect_lazy(url, config.max_connections, timeout)?))
        }
    }
}
