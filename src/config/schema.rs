//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the default
//! backend. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the default backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BackendConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Request classification and redirect settings.
    pub routing: RoutingConfig,

    /// Existence lookup backend.
    pub lookup: LookupConfig,

    /// Static asset directory.
    pub static_files: StaticFilesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:60000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:60000".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// How the app URL handed to the loading page is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppUrlStyle {
    /// `{subdomain}.{base host}` on the base URL's scheme and port.
    #[default]
    Subdomain,
    /// The resolved host and port, verbatim, on the base URL's scheme.
    ForwardHost,
}

/// How the app URL is attached to the loading page URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadingParamStyle {
    /// `?url=<encoded>`
    #[default]
    Query,
    /// `/<encoded>` joined onto the loading page path.
    Path,
}

/// How a missing workload is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundStyle {
    /// Serve `{static}/404.html` with a 404 status.
    #[default]
    Serve,
    /// Redirect to `/static/404.html`.
    Redirect,
}

/// Request classification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Parent domain VICE apps live under (e.g., "cyverse.run").
    pub vice_domain: String,

    /// Base URL the app URL is built from.
    pub base_url: String,

    /// Where requests without a subdomain are sent.
    pub landing_page_url: String,

    /// Interstitial page shown while a workload starts.
    pub loading_page_url: String,

    /// Ignore `X-Frontend-Url` and use the request's own Host header.
    pub disable_custom_header_match: bool,

    /// Reject addresses outside `vice_domain` with a 400.
    pub check_domain: bool,

    pub app_url_style: AppUrlStyle,

    pub loading_param_style: LoadingParamStyle,

    pub not_found: NotFoundStyle,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            vice_domain: "cyverse.run".to_string(),
            base_url: "https://cyverse.run".to_string(),
            landing_page_url: "https://cyverse.run".to_string(),
            loading_page_url: "https://loading.cyverse.run".to_string(),
            disable_custom_header_match: false,
            check_domain: true,
            app_url_style: AppUrlStyle::default(),
            loading_param_style: LoadingParamStyle::default(),
            not_found: NotFoundStyle::default(),
        }
    }
}

/// Which existence lookup implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookupBackend {
    #[default]
    Graphql,
    Sql,
}

/// Existence lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Backend used to answer "does this subdomain belong to a job".
    pub backend: LookupBackend,

    /// GraphQL endpoint (graphql backend).
    pub graphql_url: String,

    /// Postgres connection string (sql backend).
    pub database_url: Option<String>,

    /// Deadline for a single lookup in seconds.
    pub timeout_secs: u64,

    /// Pool size for the sql backend.
    pub max_connections: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            backend: LookupBackend::default(),
            graphql_url: "http://graphql-de/v1alpha1/graphql".to_string(),
            database_url: None,
            timeout_secs: 10,
            max_connections: 5,
        }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory served under `/static/`; must contain `404.html`.
    pub path: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            path: "./static".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
