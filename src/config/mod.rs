//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML or JSON)
//!     → loader.rs (parse, deserialize, resolve body file paths)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → registry + router built from it
//!
//! On change (config or body file):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds state and swaps it atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    FilterConfig, ListenerConfig, ObservabilityConfig, ResponseConfig, RouteConfig, ServerConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
pub use watcher::{ConfigWatcher, WatchHandle};
