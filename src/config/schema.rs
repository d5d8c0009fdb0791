//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::CONTINUE_RESOLVING;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Dispatch behavior shared by every `multi` table.
    pub resolver: ResolverConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Root route table, checked in order.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Include the tried patterns in 404 bodies.
    pub debug_not_found: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            debug_not_found: false,
        }
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Error kinds treated as a decline.
    pub catch: Vec<String>,

    /// Wrap handlers with timing telemetry.
    pub telemetry: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            catch: vec![CONTINUE_RESOLVING.to_string()],
            telemetry: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// One entry of a route table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteConfig {
    /// Leaf route bound to a responder.
    Route(RouteEntry),
    /// Conventional nested table (first match wins).
    Include(IncludeEntry),
    /// Overlapping table with fallthrough dispatch.
    Multi(MultiEntry),
}

impl RouteConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            RouteConfig::Route(_) => "route",
            RouteConfig::Include(_) => "include",
            RouteConfig::Multi(_) => "multi",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteEntry {
    /// Name used for reverse lookup.
    #[serde(default)]
    pub name: Option<String>,

    /// Brace template such as `{name}/`.
    #[serde(default)]
    pub path: Option<String>,

    /// Raw regular expression such as `^(\w+)/$`.
    #[serde(default)]
    pub regex: Option<String>,

    /// Extra keyword arguments; captured values win.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,

    pub responder: ResponderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct IncludeEntry {
    /// Brace template prefix such as `find/`.
    #[serde(default)]
    pub path: Option<String>,

    /// Raw regex prefix such as `^find/`.
    #[serde(default)]
    pub regex: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub app_name: Option<String>,

    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MultiEntry {
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub app_name: Option<String>,

    /// Overrides `resolver.catch` for this table.
    #[serde(default)]
    pub catch: Option<Vec<String>>,

    pub routes: Vec<RouteConfig>,
}

/// What a route does when dispatched.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponderConfig {
    /// Fixed body.
    Text {
        #[serde(default = "default_status")]
        status: u16,
        body: String,
    },
    /// Body rendered from the captured arguments.
    Template {
        #[serde(default = "default_status")]
        status: u16,
        body: String,
    },
    /// Look an argument up in a table; decline when it is absent.
    Lookup {
        /// Argument name, or a positional index such as `0`.
        param: String,
        entries: BTreeMap<String, String>,
        #[serde(default = "default_lookup_body")]
        body: String,
        #[serde(default = "default_status")]
        status: u16,
        #[serde(default)]
        missing: MissingPolicy,
    },
    /// Always fail with an error of the given kind.
    Reject {
        kind: String,
        #[serde(default)]
        message: String,
    },
}

impl ResponderConfig {
    pub fn type_name(&self) -> &'static str {
        match self {
            ResponderConfig::Text { .. } => "text",
            ResponderConfig::Template { .. } => "template",
            ResponderConfig::Lookup { .. } => "lookup",
            ResponderConfig::Reject { .. } => "reject",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ResponderConfig::Text { status, .. }
            | ResponderConfig::Template { status, .. }
            | ResponderConfig::Lookup { status, .. } => Some(*status),
            ResponderConfig::Reject { .. } => None,
        }
    }
}

/// What a lookup does when the argument is not in its table.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Let the next candidate try.
    #[default]
    Decline,
    /// Fail the request with a `not_found` error.
    Error,
}

fn default_status() -> u16 {
    200
}

fn default_lookup_body() -> String {
    "{value}".to_string()
}
