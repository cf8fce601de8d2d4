//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Planner and HTTP layer produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID attached to every routing decision log
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
