//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every pattern compiles
//! - Validate value ranges (status codes, timeouts, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AppConfig, ResponderConfig, RouteConfig};
use crate::routing::{PathTemplate, RegexPath};

/// A semantic problem at a location in the config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {message}")]
pub struct ValidationError {
    /// Dotted path such as `routes[1].routes[0]`.
    pub location: String,
    pub message: String,
}

impl ValidationError {
    fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("invalid socket address {:?}", config.listener.bind_address),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address {:?}", config.observability.metrics_address),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }
    check_catch(&config.resolver.catch, "resolver.catch", &mut errors);

    validate_routes(&config.routes, "routes", &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(routes: &[RouteConfig], location: &str, errors: &mut Vec<ValidationError>) {
    for (i, route) in routes.iter().enumerate() {
        let here = format!("{}[{}]", location, i);
        match route {
            RouteConfig::Route(entry) => {
                match (&entry.path, &entry.regex) {
                    (Some(path), None) => {
                        if let Err(e) = PathTemplate::endpoint(path) {
                            errors.push(ValidationError::new(&here, e.to_string()));
                        }
                    }
                    (None, Some(regex)) => {
                        if let Err(e) = RegexPath::new(regex) {
                            errors.push(ValidationError::new(&here, e.to_string()));
                        }
                    }
                    _ => errors.push(ValidationError::new(
                        &here,
                        "route needs exactly one of `path` or `regex`",
                    )),
                }
                if matches!(&entry.name, Some(name) if name.is_empty() || name.contains(':')) {
                    errors.push(ValidationError::new(
                        &here,
                        "route name must be non-empty and must not contain ':'",
                    ));
                }
                validate_responder(&entry.responder, &format!("{}.responder", here), errors);
            }
            RouteConfig::Include(entry) => {
                match (&entry.path, &entry.regex) {
                    (Some(path), None) => {
                        if let Err(e) = PathTemplate::prefix(path) {
                            errors.push(ValidationError::new(&here, e.to_string()));
                        }
                    }
                    (None, Some(regex)) => {
                        if let Err(e) = RegexPath::new(regex) {
                            errors.push(ValidationError::new(&here, e.to_string()));
                        }
                    }
                    _ => errors.push(ValidationError::new(
                        &here,
                        "include needs exactly one of `path` or `regex`",
                    )),
                }
                check_namespace(entry.namespace.as_deref(), &here, errors);
                if entry.routes.is_empty() {
                    errors.push(ValidationError::new(&here, "include has no routes"));
                }
                validate_routes(&entry.routes, &format!("{}.routes", here), errors);
            }
            RouteConfig::Multi(entry) => {
                check_namespace(entry.namespace.as_deref(), &here, errors);
                if let Some(catch) = &entry.catch {
                    check_catch(catch, &format!("{}.catch", here), errors);
                }
                if entry.routes.is_empty() {
                    errors.push(ValidationError::new(&here, "multi table has no routes"));
                }
                validate_routes(&entry.routes, &format!("{}.routes", here), errors);
            }
        }
    }
}

fn validate_responder(responder: &ResponderConfig, location: &str, errors: &mut Vec<ValidationError>) {
    if let Some(status) = responder.status() {
        if !(100..=599).contains(&status) {
            errors.push(ValidationError::new(
                location,
                format!("status {} is not a valid HTTP status code", status),
            ));
        }
    }
    match responder {
        ResponderConfig::Lookup { param, .. } if param.is_empty() => {
            errors.push(ValidationError::new(location, "lookup `param` must not be empty"));
        }
        ResponderConfig::Reject { kind, .. } if kind.is_empty() => {
            errors.push(ValidationError::new(location, "reject `kind` must not be empty"));
        }
        _ => {}
    }
}

fn check_catch(catch: &[String], location: &str, errors: &mut Vec<ValidationError>) {
    if catch.iter().any(|kind| kind.is_empty()) {
        errors.push(ValidationError::new(location, "catch kinds must not be empty"));
    }
}

fn check_namespace(namespace: Option<&str>, location: &str, errors: &mut Vec<ValidationError>) {
    if matches!(namespace, Some(ns) if ns.is_empty() || ns.contains(':')) {
        errors.push(ValidationError::new(
            location,
            "namespace must be non-empty and must not contain ':'",
        ));
    }
}
