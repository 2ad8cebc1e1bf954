//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → AdapterRegistry / AuthSessionManager / HTTP console
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdapterConfig, AdapterKind, AppConfig, ConsoleConfig, ObservabilityConfig, PluginConfig,
    PluginKind, RpcConfig, SessionConfig, Web3AuthNetwork,
};
