//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ScraperConfig (validated, immutable)
//!     → handed to the executor, supervisor and server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_overrides, load_config, parse_config, ConfigError};
pub use schema::BrowserConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ScraperConfig;
pub use schema::StaticFetchConfig;
pub use schema::TimeoutConfig;
