//! Route tree construction from configuration.

use std::sync::Arc;

use crate::config::schema::{AppConfig, IncludeEntry, MultiEntry, RouteConfig, RouteEntry};
use crate::http::request::HttpContext;
use crate::http::response::Reply;
use crate::observability::tracing::{NoopTelemetry, Telemetry, TracingTelemetry};
use crate::responders::Responder;
use crate::routing::{
    multiurl, CatchSet, Include, PatternError, Route, Router, SharedPattern,
};

type HttpPattern = SharedPattern<HttpContext, Reply>;

/// Build the root router for a validated config.
pub fn build_router(config: &AppConfig) -> Result<Router<HttpContext, Reply>, PatternError> {
    let telemetry: Arc<dyn Telemetry> = if config.resolver.telemetry {
        Arc::new(TracingTelemetry)
    } else {
        Arc::new(NoopTelemetry)
    };
    let catch = CatchSet::new(config.resolver.catch.iter().cloned());

    let patterns = build_patterns(&config.routes, &catch)?;
    tracing::debug!(routes = patterns.len(), telemetry = telemetry.is_enabled(), "Route table built");

    Ok(Router::new(patterns).with_catch(catch).with_telemetry(telemetry))
}

fn build_patterns(routes: &[RouteConfig], catch: &CatchSet) -> Result<Vec<HttpPattern>, PatternError> {
    routes.iter().map(|route| build_pattern(route, catch)).collect()
}

fn build_pattern(route: &RouteConfig, catch: &CatchSet) -> Result<HttpPattern, PatternError> {
    match route {
        RouteConfig::Route(entry) => build_route(entry),
        RouteConfig::Include(entry) => build_include(entry, catch),
        RouteConfig::Multi(entry) => build_multi(entry, catch),
    }
}

fn build_route(entry: &RouteEntry) -> Result<HttpPattern, PatternError> {
    let source = entry.path.as_deref().or(entry.regex.as_deref()).unwrap_or_default();
    let handler_name = entry.name.clone().unwrap_or_else(|| source.to_string());
    let handler = Arc::new(Responder::from_config(handler_name, &entry.responder));

    let mut route = match (&entry.path, &entry.regex) {
        (Some(path), _) => Route::path(path, handler)?,
        (None, Some(regex)) => Route::regex(regex, handler)?,
        (None, None) => Route::path("", handler)?,
    };
    if let Some(name) = &entry.name {
        route = route.name(name.clone());
    }
    Ok(route.defaults(entry.defaults.clone()).into_shared())
}

fn build_include(entry: &IncludeEntry, catch: &CatchSet) -> Result<HttpPattern, PatternError> {
    let children = build_patterns(&entry.routes, catch)?;
    let mut include = match (&entry.path, &entry.regex) {
        (Some(path), _) => Include::path(path, children)?,
        (None, Some(regex)) => Include::regex(regex, children)?,
        (None, None) => Include::path("", children)?,
    };
    if let Some(namespace) = &entry.namespace {
        include = include.namespace(namespace.clone());
    }
    if let Some(app_name) = &entry.app_name {
        include = include.app_name(app_name.clone());
    }
    Ok(include.into_shared())
}

fn build_multi(entry: &MultiEntry, catch: &CatchSet) -> Result<HttpPattern, PatternError> {
    let catch = match &entry.catch {
        Some(kinds) => CatchSet::new(kinds.iter().cloned()),
        None => catch.clone(),
    };
    let children = build_patterns(&entry.routes, &catch)?;

    let mut multi = multiurl(children).catch(catch);
    if let Some(namespace) = &entry.namespace {
        multi = multi.namespace(namespace.clone());
    }
    if let Some(app_name) = &entry.app_name {
        multi = multi.app_name(app_name.clone());
    }
    Ok(multi.into_shared())
}
