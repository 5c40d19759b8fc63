//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CLI overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ExporterConfig (validated, immutable)
//!     → consumed once at startup by the exporter
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the upstream set never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ExporterConfig, FetchConfig, ListenerConfig, ObservabilityConfig, ShutdownConfig};
pub use validation::{validate_config, ValidationError};
