//! Subdomain extraction.

use std::fmt;

/// Label(s) identifying a workload. Empty means "no subdomain present".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Subdomain(String);

impl Subdomain {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Subdomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reserved label treated as the bare domain.
const WWW: &str = "www";

/// Derive the subdomain from a host by dropping the port and the two
/// right-most labels. `www` alone counts as no subdomain. One trailing root
/// `.` is ignored.
pub fn extract_subdomain(host: &str) -> Subdomain {
    let host = strip_port(host);
    let host = host.strip_suffix('.').unwrap_or(host);
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return Subdomain::default();
    }

    let leading = &labels[..labels.len() - 2];
    if leading.is_empty() || leading == [WWW] {
        return Subdomain::default();
    }
    Subdomain(leading.join("."))
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}
