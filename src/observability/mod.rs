//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing and HTTP produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (handler spans, transaction names)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span
//! - Metric updates go through the `metrics` facade; they are no-ops until
//!   an exporter is installed
//! - Handler telemetry is injected, and off unless configured

pub mod logging;
pub mod metrics;
pub mod tracing;
