//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + command-line overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BackendConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    AppUrlStyle, BackendConfig, ListenerConfig, LoadingParamStyle, LogFormat, LookupBackend,
    LookupConfig, NotFoundStyle, ObservabilityConfig, RoutingConfig, StaticFilesConfig,
    TimeoutConfig, TlsConfig,
};
pub use validation::{validate_config, ValidationError};
