//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → PanopticonConfig (validated, immutable)
//!
//! Manifest changes (sync --watch):
//!     watcher.rs detects change
//!     → manifest reloaded
//!     → full re-sync of every artefact
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_with_env, ConfigError};
pub use schema::DiscoveryConfig;
pub use schema::ObservabilityConfig;
pub use schema::PanopticonConfig;
pub use schema::RetryConfig;
pub use schema::RouterApiConfig;
