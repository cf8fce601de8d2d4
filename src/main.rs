//! VICE default backend.
//!
//! # Architecture Overview
//!
//! ```text
//!     Ingress fallback        ┌──────────────────────────────────────────────┐
//!     ────────────────────────┼─▶ http server ──▶ routing planner            │
//!                             │      │              │  resolver              │
//!                             │      │              │  domain matcher        │
//!                             │      │              │  subdomain extractor   │
//!                             │      │              └─▶ existence lookup ────┼──▶ GraphQL / Postgres
//!     307 / 404               │      ▼                                       │
//!     ◀───────────────────────┼── response (loading | landing | 404 page)    │
//!                             │                                              │
//!                             │  /healthz, /static/*  served directly        │
//!                             └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use vice_default_backend::config::{
    read_config, validate_config, BackendConfig, LookupBackend, TlsConfig,
};
use vice_default_backend::lifecycle::startup;
use vice_default_backend::observability::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "vice-default-backend")]
#[command(about = "Default backend routing VICE subdomains to the loading, landing or 404 page", long_about = None)]
struct Cli {
    /// TOML configuration file; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The listen address.
    #[arg(long)]
    listen: Option<String>,

    /// The path to the SSL .crt file.
    #[arg(long)]
    ssl_cert: Option<String>,

    /// The path to the SSL .key file.
    #[arg(long)]
    ssl_key: Option<String>,

    /// The base URL for the graphql provider.
    #[arg(long)]
    graphql: Option<String>,

    /// Postgres connection string for the sql lookup backend.
    #[arg(long)]
    database_url: Option<String>,

    /// Existence lookup backend.
    #[arg(long, value_parser = parse_backend)]
    lookup_backend: Option<LookupBackend>,

    /// The domain and port for VICE apps.
    #[arg(long)]
    vice_domain: Option<String>,

    /// The base URL app URLs are built from.
    #[arg(long)]
    base_url: Option<String>,

    /// The URL for the landing page service.
    #[arg(long)]
    landing_page_url: Option<String>,

    /// The URL for the loading page service.
    #[arg(long)]
    loading_page_url: Option<String>,

    /// Path to static file assets.
    #[arg(long)]
    static_file_path: Option<String>,

    /// Use the Host header instead of X-Frontend-Url for subdomain matching.
    #[arg(long)]
    disable_custom_header_match: bool,

    /// Accept addresses outside the VICE domain.
    #[arg(long)]
    skip_domain_check: bool,
}

fn parse_backend(s: &str) -> Result<LookupBackend, String> {
    match s {
        "graphql" => Ok(LookupBackend::Graphql),
        "sql" => Ok(LookupBackend::Sql),
        other => Err(format!("unknown lookup backend '{}' (graphql|sql)", other)),
    }
}

impl Cli {
    fn apply(self, config: &mut BackendConfig) {
        if let Some(v) = self.listen {
            config.listener.bind_address = v;
        }
        if self.ssl_cert.is_some() || self.ssl_key.is_some() {
            config.listener.tls = Some(TlsConfig {
                cert_path: self.ssl_cert.unwrap_or_default(),
                key_path: self.ssl_key.unwrap_or_default(),
            });
        }
        if let Some(v) = self.graphql {
            config.lookup.graphql_url = v;
        }
        if let Some(v) = self.database_url {
            config.lookup.database_url = Some(v);
        }
        if let Some(v) = self.lookup_backend {
            config.lookup.backend = v;
        }
        if let Some(v) = self.vice_domain {
            config.routing.vice_domain = v;
        }
        if let Some(v) = self.base_url {
            config.routing.base_url = v;
        }
        if let Some(v) = self.landing_page_url {
            config.routing.landing_page_url = v;
        }
        if let Some(v) = self.loading_page_url {
            config.routing.loading_page_url = v;
        }
        if let Some(v) = self.static_file_path {
            config.static_files.path = v;
        }
        if self.disable_custom_header_match {
            config.routing.disable_custom_header_match = true;
        }
        if self.skip_domain_check {
            config.routing.check_domain = false;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match read_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => BackendConfig::default(),
    };
    cli.apply(&mut config);

    init_logging(&config.observability);
    tracing::info!(
        service = "vice-default-backend",
        version = env!("CARGO_PKG_VERSION"),
        "Starting"
    );

    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            tracing::error!(error = %e, "Invalid configuration");
        }
        return ExitCode::FAILURE;
    }

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Fatal error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
