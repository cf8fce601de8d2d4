//! Request classification subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host, TLS, X-Frontend-Url, path, query)
//!     → resolver.rs (ResolvedAddress)
//!     → matcher.rs (optional parent-domain check)
//!     → subdomain.rs (candidate subdomain)
//!     → lookup (does a workload own it?)
//!     → planner.rs (Loading | Landing | NotFound | RoutingError)
//! ```
//!
//! # Design Decisions
//! - Strategies (resolver, lookup) chosen at startup, immutable at runtime
//! - Deterministic: same request and config always resolve the same way
//! - No state carried between requests

pub mod error;
pub mod matcher;
pub mod planner;
pub mod resolver;
pub mod subdomain;

pub use error::RoutingError;
pub use matcher::DomainMatcher;
pub use planner::{RedirectPlanner, RoutingDecision, RoutingOutcome};
pub use resolver::{
    resolver_for, AddressResolver, FrontendHeaderResolver, HostHeaderResolver, InboundRequest,
    ResolvedAddress,
};
pub use subdomain::{extract_subdomain, Subdomain};
