//! GraphQL-backed existence lookup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{ExistenceLookup, LookupError};

const SUBDOMAIN_QUERY: &str = r#"
query Subdomain($subdomain: String) {
  jobs(where: {subdomain: {_eq: $subdomain}}) {
    id
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<JobsData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct JobsData {
    jobs: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

/// Looks subdomains up through the jobs GraphQL API.
#[derive(Debug, Clone)]
pub struct GraphqlLookup {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl GraphqlLookup {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, LookupError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| LookupError::Config(format!("graphql url '{}': {}", endpoint, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LookupError::Transport)?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    fn map_transport(&self, e: reqwest::Error) -> LookupError {
        if e.is_timeout() {
            LookupError::Timeout(self.timeout)
        } else {
            LookupError::Transport(e)
        }
    }
}

#[async_trait]
impl ExistenceLookup for GraphqlLookup {
    async fn exists(&self, subdomain: &str) -> Result<bool, LookupError> {
        let body = json!({
            "query": SUBDOMAIN_QUERY,
            "variables": { "subdomain": subdomain },
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let parsed: GraphqlResponse = response.json().await.map_err(|e| self.map_transport(e))?;
        if let Some(first) = parsed.errors.first() {
            return Err(LookupError::Query(first.message.clone()));
        }

        let jobs = parsed
            .data
            .and_then(|d| d.jobs)
            .ok_or_else(|| LookupError::MissingField {
                field: "jobs",
                subdomain: subdomain.to_string(),
            })?;

        Ok(!jobs.is_empty())
    }

    fn name(&self) -> &'static str {
        "graphql"
    }
}
