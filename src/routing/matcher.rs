//! Domain containment check.
//!
//! # Responsibilities
//! - Decide whether a host is the configured parent domain or a subdomain of it
//! - Accept an optional `:port` suffix and one trailing root `.`
//!
//! # Design Decisions
//! - Pattern compiled once at startup, matching is infallible afterwards
//! - Anchored on label boundaries: `notcyverse.run` is not in `cyverse.run`
//! - The domain is escaped so its dots are literal
//! - Case-insensitive, as DNS names are

use regex::Regex;

use crate::routing::error::RoutingError;

/// Matches hosts belonging to a parent domain.
#[derive(Debug, Clone)]
pub struct DomainMatcher {
    domain: String,
    pattern: Regex,
}

impl DomainMatcher {
    /// Compile a matcher for `domain`.
    pub fn new(domain: impl Into<String>) -> Result<Self, RoutingError> {
        let domain = domain.into();
        let source = format!(
            r"(?i)^(?:[^.:/]+\.)*{}\.?(?::[0-9]+)?$",
            regex::escape(&domain)
        );
        let pattern = Regex::new(&source).map_err(|e| RoutingError::resolution(&domain, e))?;
        Ok(Self { domain, pattern })
    }

    /// The configured parent domain.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if `host` is the parent domain or one of its subdomains.
    pub fn matches(&self, host: &str) -> bool {
        self.pattern.is_match(host)
    }
}
