//! Postgres-backed existence lookup.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{ExistenceLookup, LookupError};

const SUBDOMAIN_QUERY: &str = "select id from jobs where subdomain = $1 limit 1";

/// Looks subdomains up directly in the jobs table.
#[derive(Debug, Clone)]
pub struct SqlLookup {
    pool: PgPool,
    timeout: Duration,
}

impl SqlLookup {
    /// Create a pool that connects on first use.
    pub fn connect_lazy(
        database_url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect_lazy(database_url)?;
        Ok(Self { pool, timeout })
    }
}

#[async_trait]
impl ExistenceLookup for SqlLookup {
    async fn exists(&self, subdomain: &str) -> Result<bool, LookupError> {
        let query = sqlx::query(SUBDOMAIN_QUERY)
            .bind(subdomain)
            .fetch_optional(&self.pool);

        let row = tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| LookupError::Timeout(self.timeout))??;
        Ok(row.is_some())
    }

    fn name(&self) -> &'static str {
        "sql"
    }
}
