//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DispatcherConfig (validated, immutable)
//!     → CLI overrides applied in main.rs
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a session starts
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ConnectionConfig, DispatcherConfig, ExecutionConfig, MalformedPolicy, ObservabilityConfig,
    ProcessingConfig,
};
