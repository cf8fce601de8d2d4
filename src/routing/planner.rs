//! Redirect planning.
//!
//! # States
//! ```text
//! Start → AddressResolved → [DomainChecked] → SubdomainExtracted
//!       → ExistenceChecked → Loading | Landing | NotFound
//! ```
//! Any non-terminal state may end in a `RoutingError` instead.
//!
//! # Design Decisions
//! - Configured URLs are parsed at construction, so a bad base URL fails startup
//! - An empty subdomain is never looked up
//! - Lookup failures are errors, never `NotFound`
//! - Single attempt per request; no retries

use std::sync::Arc;
use std::time::Instant;

use url::{form_urlencoded, Url};

use crate::config::{AppUrlStyle, LoadingParamStyle, RoutingConfig};
use crate::lookup::ExistenceLookup;
use crate::observability::metrics;
use crate::routing::error::RoutingError;
use crate::routing::matcher::DomainMatcher;
use crate::routing::resolver::{resolver_for, AddressResolver, InboundRequest, ResolvedAddress};
use crate::routing::subdomain::{extract_subdomain, Subdomain};

/// Query parameter the loading page reads the app URL from.
pub const LOADING_URL_PARAM: &str = "url";

/// Where a request ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingOutcome {
    /// Workload exists; send the client to the loading page with this app URL.
    Loading(Url),
    /// No subdomain; send the client to the landing page.
    Landing,
    /// Subdomain is not owned by any workload.
    NotFound,
}

impl RoutingOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            RoutingOutcome::Loading(_) => "loading",
            RoutingOutcome::Landing => "landing",
            RoutingOutcome::NotFound => "not_found",
        }
    }
}

/// A planner decision and the subdomain it was made for.
#[derive(Debug)]
pub struct RoutingDecision {
    /// Empty when the request never got as far as extraction, or had none.
    pub subdomain: Subdomain,
    pub result: Result<RoutingOutcome, RoutingError>,
}

/// Combines resolution, domain check, extraction and lookup into one decision.
pub struct RedirectPlanner {
    resolver: Arc<dyn AddressResolver>,
    domain: Option<DomainMatcher>,
    lookup: Arc<dyn ExistenceLookup>,
    base_url: Url,
    landing_page_url: String,
    loading_page_url: Url,
    app_url_style: AppUrlStyle,
    loading_param_style: LoadingParamStyle,
}

impl std::fmt::Debug for RedirectPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectPlanner")
            .field("resolver", &self.resolver)
            .field("domain", &self.domain.as_ref().map(DomainMatcher::domain))
            .field("lookup", &self.lookup.name())
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RedirectPlanner {
    /// Build a planner using the resolver the configuration selects.
    pub fn from_config(
        config: &RoutingConfig,
        lookup: Arc<dyn ExistenceLookup>,
    ) -> Result<Self, RoutingError> {
        Self::new(config, resolver_for(config), lookup)
    }

    pub fn new(
        config: &RoutingConfig,
        resolver: Arc<dyn AddressResolver>,
        lookup: Arc<dyn ExistenceLookup>,
    ) -> Result<Self, RoutingError> {
        let domain = if config.check_domain {
            Some(DomainMatcher::new(config.vice_domain.clone())?)
        } else {
            None
        };

        let base_url = parse_absolute(&config.base_url)?;
        parse_absolute(&config.landing_page_url)?;
        let loading_page_url = parse_absolute(&config.loading_page_url)?;

        Ok(Self {
            resolver,
            domain,
            lookup,
            base_url,
            landing_page_url: config.landing_page_url.clone(),
            loading_page_url,
            app_url_style: config.app_url_style,
            loading_param_style: config.loading_param_style,
        })
    }

    /// Decide what to do with a request.
    pub async fn plan(&self, request: &InboundRequest) -> Result<RoutingOutcome, RoutingError> {
        self.decide(request).await.result
    }

    /// Like [`plan`](Self::plan), keeping the extracted subdomain for logging.
    pub async fn decide(&self, request: &InboundRequest) -> RoutingDecision {
        let mut subdomain = Subdomain::default();
        let result = self.plan_into(request, &mut subdomain).await;
        RoutingDecision { subdomain, result }
    }

    async fn plan_into(
        &self,
        request: &InboundRequest,
        extracted: &mut Subdomain,
    ) -> Result<RoutingOutcome, RoutingError> {
        let address = self.resolver.resolve(request)?;

        if let Some(matcher) = &self.domain {
            if !matcher.matches(&address.host) {
                return Err(RoutingError::DomainMismatch {
                    host: address.host,
                    domain: matcher.domain().to_string(),
                });
            }
        }

        let subdomain = extract_subdomain(&address.host);
        *extracted = subdomain.clone();
        if subdomain.is_empty() {
            tracing::debug!(host = %address.host, "No subdomain, routing to landing page");
            return Ok(RoutingOutcome::Landing);
        }

        let started = Instant::now();
        let found = self.lookup.exists(subdomain.as_str()).await;
        metrics::record_lookup(self.lookup.name(), started);

        let found = found.map_err(|source| RoutingError::Lookup {
            subdomain: subdomain.to_string(),
            source,
        })?;

        tracing::debug!(
            host = %address.host,
            subdomain = %subdomain,
            found,
            backend = self.lookup.name(),
            "Subdomain looked up"
        );

        if !found {
            return Ok(RoutingOutcome::NotFound);
        }
        Ok(RoutingOutcome::Loading(self.app_url(&address, &subdomain)?))
    }

    /// Build the URL of the app behind `subdomain`, keeping the original
    /// path and raw query.
    pub fn app_url(
        &self,
        address: &ResolvedAddress,
        subdomain: &Subdomain,
    ) -> Result<Url, RoutingError> {
        let mut url = match self.app_url_style {
            AppUrlStyle::Subdomain => {
                let mut url = self.base_url.clone();
                let base_host = url.host_str().unwrap_or_default();
                let host = format!("{}.{}", subdomain, base_host);
                url.set_host(Some(&host))
                    .map_err(|e| RoutingError::resolution(host.as_str(), e))?;
                url
            }
            AppUrlStyle::ForwardHost => {
                let raw = format!("{}://{}/", self.base_url.scheme(), address.host);
                Url::parse(&raw).map_err(|e| RoutingError::resolution(raw.as_str(), e))?
            }
        };

        if address.path.is_empty() {
            url.set_path("/");
        } else {
            url.set_path(&address.path);
        }
        url.set_query(address.raw_query.as_deref());
        url.set_fragment(None);
        Ok(url)
    }

    /// The loading page URL carrying `app_url`.
    pub fn loading_redirect_url(&self, app_url: &Url) -> Url {
        let mut url = self.loading_page_url.clone();
        match self.loading_param_style {
            LoadingParamStyle::Query => {
                let retained: Vec<(String, String)> = url
                    .query_pairs()
                    .filter(|(k, _)| k != LOADING_URL_PARAM)
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                url.set_query(None);
                url.query_pairs_mut()
                    .extend_pairs(retained.iter())
                    .append_pair(LOADING_URL_PARAM, app_url.as_str());
            }
            LoadingParamStyle::Path => {
                let encoded: String =
                    form_urlencoded::byte_serialize(app_url.as_str().as_bytes()).collect();
                let path = format!("{}/{}", url.path().trim_end_matches('/'), encoded);
                url.set_path(&path);
            }
        }
        url
    }

    /// Landing page URL, exactly as configured.
    pub fn landing_page_url(&self) -> &str {
        &self.landing_page_url
    }
}

fn parse_absolute(raw: &str) -> Result<Url, RoutingError> {
    let url = Url::parse(raw).map_err(|e| RoutingError::resolution(raw, e))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(RoutingError::resolution(raw, "URL has no host"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupError;
    use crate::routing::resolver::HostHeaderResolver;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every subdomain it is asked about.
    struct SpyLookup {
        answer: fn() -> Result<bool, LookupError>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl SpyLookup {
        fn new(answer: fn() -> Result<bool, LookupError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ExistenceLookup for SpyLookup {
        async fn exists(&self, subdomain: &str) -> Result<bool, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(subdomain.to_string());
            (self.answer)()
        }

        fn name(&self) -> &'static str {
            "spy"
        }
    }

    fn host_mode() -> RoutingConfig {
        RoutingConfig {
            disable_custom_header_match: true,
            ..RoutingConfig::default()
        }
    }

    fn request(host: &str, path: &str, query: Option<&str>) -> InboundRequest {
        InboundRequest {
            host: Some(host.to_string()),
            tls: false,
            path: path.to_string(),
            raw_query: query.map(str::to_string),
            frontend_url: None,
        }
    }

    #[tokio::test]
    async fn test_empty_subdomain_skips_lookup() {
        let spy = SpyLookup::new(|| Ok(true));
        let planner = RedirectPlanner::from_config(&host_mode(), spy.clone()).unwrap();

        for host in ["cyverse.run", "www.cyverse.run", "cyverse.run:80"] {
            let outcome = planner.plan(&request(host, "/", None)).await.unwrap();
            assert_eq!(outcome, RoutingOutcome::Landing);
        }
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_found_builds_app_url() {
        let spy = SpyLookup::new(|| Ok(true));
        let planner = RedirectPlanner::from_config(&host_mode(), spy.clone()).unwrap();

        let outcome = planner
            .plan(&request("job123.cyverse.run", "/lab/tree", Some("token=a%20b&x=1")))
            .await
            .unwrap();

        let RoutingOutcome::Loading(app_url) = outcome else {
            panic!("expected loading outcome, got {:?}", outcome);
        };
        assert_eq!(app_url.host_str(), Some("job123.cyverse.run"));
        assert_eq!(app_url.scheme(), "https");
        assert_eq!(app_url.path(), "/lab/tree");
        assert_eq!(app_url.query(), Some("token=a%20b&x=1"));
        assert_eq!(*spy.seen.lock().unwrap(), vec!["job123".to_string()]);
    }

    #[tokio::test]
    async fn test_not_found_and_error_are_distinct() {
        let missing = SpyLookup::new(|| Ok(false));
        let planner = RedirectPlanner::from_config(&host_mode(), missing).unwrap();
        let outcome = planner.plan(&request("ghost99.cyverse.run", "/", None)).await;
        assert_eq!(outcome.unwrap(), RoutingOutcome::NotFound);

        let broken = SpyLookup::new(|| Err(LookupError::Status(503)));
        let planner = RedirectPlanner::from_config(&host_mode(), broken).unwrap();
        match planner.plan(&request("job123.cyverse.run", "/", None)).await {
            Err(RoutingError::Lookup { subdomain, .. }) => assert_eq!(subdomain, "job123"),
            other => panic!("expected lookup error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subdomain_passed_literally() {
        let spy = SpyLookup::new(|| Ok(false));
        let planner = RedirectPlanner::from_config(&host_mode(), spy.clone()).unwrap();
        planner
            .plan(&request("JobABC.lab.cyverse.run:8080", "/", None))
            .await
            .unwrap();
        assert_eq!(*spy.seen.lock().unwrap(), vec!["JobABC.lab".to_string()]);
    }

    #[tokio::test]
    async fn test_header_subdomain_passed_literally() {
        let spy = SpyLookup::new(|| Ok(false));
        let planner = RedirectPlanner::from_config(&RoutingConfig::default(), spy.clone()).unwrap();
        let req = InboundRequest {
            frontend_url: Some(HeaderValue::from_static("https://JobABC.cyverse.run/")),
            ..request("default-backend.svc", "/", None)
        };

        let outcome = planner.plan(&req).await.unwrap();
        assert_eq!(outcome, RoutingOutcome::NotFound);
        assert_eq!(*spy.seen.lock().unwrap(), vec!["JobABC".to_string()]);
    }

    #[tokio::test]
    async fn test_fully_qualified_host_is_in_domain() {
        let spy = SpyLookup::new(|| Ok(true));
        let planner = RedirectPlanner::from_config(&host_mode(), spy.clone()).unwrap();

        let outcome = planner.plan(&request("job123.cyverse.run.", "/", None)).await;
        assert!(matches!(outcome, Ok(RoutingOutcome::Loading(_))));
        assert_eq!(*spy.seen.lock().unwrap(), vec!["job123".to_string()]);
    }

    #[tokio::test]
    async fn test_decision_reports_subdomain() {
        let planner =
            RedirectPlanner::from_config(&host_mode(), SpyLookup::new(|| Ok(false))).unwrap();
        let decision = planner.decide(&request("job123.cyverse.run", "/", None)).await;
        assert_eq!(decision.subdomain.as_str(), "job123");
        assert_eq!(decision.result.unwrap(), RoutingOutcome::NotFound);

        let decision = planner.decide(&request("www.cyverse.run", "/", None)).await;
        assert!(decision.subdomain.is_empty());
        assert_eq!(decision.result.unwrap(), RoutingOutcome::Landing);

        let decision = planner.decide(&request("job123.example.org", "/", None)).await;
        assert!(decision.subdomain.is_empty());
        assert!(matches!(decision.result, Err(RoutingError::DomainMismatch { .. })));
    }

    #[tokio::test]
    async fn test_out_of_domain() {
        let spy = SpyLookup::new(|| Ok(true));
        let planner = RedirectPlanner::from_config(&host_mode(), spy.clone()).unwrap();

        let err = planner
            .plan(&request("job123.evilcyverse.run", "/", None))
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::DomainMismatch { .. }));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_domain_check_can_be_disabled() {
        let config = RoutingConfig {
            check_domain: false,
            ..host_mode()
        };
        let spy = SpyLookup::new(|| Ok(false));
        let planner = RedirectPlanner::from_config(&config, spy.clone()).unwrap();

        let outcome = planner.plan(&request("job123.example.org", "/", None)).await;
        assert_eq!(outcome.unwrap(), RoutingOutcome::NotFound);
        assert_eq!(*spy.seen.lock().unwrap(), vec!["job123".to_string()]);
    }

    #[tokio::test]
    async fn test_header_mode_without_header() {
        let spy = SpyLookup::new(|| Ok(true));

        let planner = RedirectPlanner::from_config(&RoutingConfig::default(), spy.clone()).unwrap();
        let err = planner.plan(&request("job123.cyverse.run", "/", None)).await;
        assert!(matches!(err, Err(RoutingError::DomainMismatch { .. })));

        let config = RoutingConfig {
            check_domain: false,
            ..RoutingConfig::default()
        };
        let planner = RedirectPlanner::from_config(&config, spy.clone()).unwrap();
        let outcome = planner.plan(&request("job123.cyverse.run", "/", None)).await;
        assert_eq!(outcome.unwrap(), RoutingOutcome::Landing);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_bad_config_fails_construction() {
        let config = RoutingConfig {
            base_url: "cyverse.run".into(),
            ..RoutingConfig::default()
        };
        let err = RedirectPlanner::new(
            &config,
            Arc::new(HostHeaderResolver),
            SpyLookup::new(|| Ok(true)),
        )
        .unwrap_err();
        assert!(matches!(err, RoutingError::AddressResolution { .. }));
    }

    #[test]
    fn test_loading_url_query_style() {
        let config = RoutingConfig {
            loading_page_url: "https://loading.cyverse.run/?theme=dark&url=stale".into(),
            ..RoutingConfig::default()
        };
        let planner = RedirectPlanner::from_config(&config, SpyLookup::new(|| Ok(true))).unwrap();
        let app_url = Url::parse("https://job123.cyverse.run/?a=1").unwrap();

        assert_eq!(
            planner.loading_redirect_url(&app_url).as_str(),
            "https://loading.cyverse.run/?theme=dark&url=https%3A%2F%2Fjob123.cyverse.run%2F%3Fa%3D1"
        );
    }

    #[test]
    fn test_loading_url_path_style() {
        let config = RoutingConfig {
            loading_page_url: "https://loading.cyverse.run/apps/".into(),
            loading_param_style: LoadingParamStyle::Path,
            ..RoutingConfig::default()
        };
        let planner = RedirectPlanner::from_config(&config, SpyLookup::new(|| Ok(true))).unwrap();
        let app_url = Url::parse("https://job123.cyverse.run/").unwrap();

        assert_eq!(
            planner.loading_redirect_url(&app_url).as_str(),
            "https://loading.cyverse.run/apps/https%3A%2F%2Fjob123.cyverse.run%2F"
        );
    }

    #[test]
    fn test_forward_host_style() {
        let config = RoutingConfig {
            app_url_style: AppUrlStyle::ForwardHost,
            base_url: "https://cyverse.run".into(),
            ..RoutingConfig::default()
        };
        let planner = RedirectPlanner::from_config(&config, SpyLookup::new(|| Ok(true))).unwrap();
        let address = ResolvedAddress {
            scheme: "http".into(),
            host: "job123.cyverse.run:8080".into(),
            path: "/x".into(),
            raw_query: Some("y=1".into()),
        };
        let subdomain = extract_subdomain(&address.host);

        let url = planner.app_url(&address, &subdomain).unwrap();
        assert_eq!(url.as_str(), "https://job123.cyverse.run:8080/x?y=1");
    }

    #[test]
    fn test_subdomain_style_keeps_base_port() {
        let config = RoutingConfig {
            base_url: "https://cyverse.run:4343/ignored?q=1".into(),
            ..RoutingConfig::default()
        };
        let planner = RedirectPlanner::from_config(&config, SpyLookup::new(|| Ok(true))).unwrap();
        let address = ResolvedAddress {
            scheme: "http".into(),
            host: "job123.cyverse.run".into(),
            path: String::new(),
            raw_query: None,
        };
        let subdomain = extract_subdomain(&address.host);

        let url = planner.app_url(&address, &subdomain).unwrap();
        assert_eq!(url.as_str(), "https://job123.cyverse.run:4343/");
    }
}
