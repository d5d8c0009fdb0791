//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, every pattern compiled once)
//!     → AppConfig (validated, immutable)
//!     → responders::build (route tree → Router)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server builds a new Router and swaps it atomically
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

pub use loader::{load_config, load_config_str, ConfigError};
pub use schema::{
    AppConfig, IncludeEntry, ListenerConfig, MissingPolicy, MultiEntry, ResponderConfig,
    RouteConfig, RouteEntry,
};
pub use watcher::ConfigWatcher;
