//! Overlapping route resolution with runtime fallthrough.
//!
//! A [`routing::MultiResolver`] (built with [`routing::multiurl`]) matches a
//! path against every one of its patterns and keeps all matches. Dispatch
//! runs the matching handlers in declaration order until one responds; a
//! handler may decline and let the next one try.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod responders;
pub mod routing;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
