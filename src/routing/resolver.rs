//! Multi-pattern resolution.
//!
//! # Responsibilities
//! - Match a path against every child pattern, not just the first hit
//! - Collect all matches in declaration order
//! - Keep a trail of every attempted pattern for `NotFound` diagnostics
//!
//! # Design Decisions
//! - Resolution is eager and pure; dispatch is lazy (see `dispatch.rs`)
//! - A resolver is itself a pattern, so it nests anywhere a pattern fits
//! - Nested multi-resolvers surface each match as its own candidate

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::observability::tracing::{NoopTelemetry, Telemetry};
use crate::routing::dispatch::{CatchSet, MultiMatch};
use crate::routing::error::{NotFound, TriedTrail};
use crate::routing::pattern::{
    record_miss, record_trail, unqualify, MatchCandidate, Pattern, ResolveResult, Resolved,
    SharedPattern,
};

/// Resolver over overlapping patterns with fallthrough dispatch.
pub struct MultiResolver<Req, Res> {
    patterns: Vec<SharedPattern<Req, Res>>,
    catch: Arc<CatchSet>,
    namespace: Option<String>,
    app_name: Option<String>,
    telemetry: Arc<dyn Telemetry>,
}

/// Build a [`MultiResolver`] over `patterns` with the default catch set.
///
/// ```
/// use multiroute::routing::{handler_fn, multiurl, Outcome, Route, RouteSlot};
///
/// let people = handler_fn("person", |_: &mut RouteSlot, args| match args.get("name") {
///     Some("jane") => Ok(Outcome::Respond("Person: Jane Doe".to_string())),
///     _ => Ok(Outcome::Decline),
/// });
/// let things = handler_fn("thing", |_: &mut RouteSlot, args| {
///     Ok(Outcome::Respond(format!("Thing: {}", args.get("name").unwrap_or_default())))
/// });
///
/// let resolver = multiurl(vec![
///     Route::path("{name}/", people).unwrap().name("person").into_shared(),
///     Route::path("{name}/", things).unwrap().name("thing").into_shared(),
/// ]);
///
/// let matched = resolver.resolve("bacon/").unwrap();
/// assert_eq!(matched.candidates().len(), 2);
/// assert_eq!(matched.dispatch(&mut RouteSlot::new()).unwrap(), "Thing: bacon");
/// ```
pub fn multiurl<Req, Res>(patterns: Vec<SharedPattern<Req, Res>>) -> MultiResolver<Req, Res> {
    MultiResolver::new(patterns)
}

impl<Req, Res> MultiResolver<Req, Res> {
    pub fn new(patterns: Vec<SharedPattern<Req, Res>>) -> Self {
        Self {
            patterns,
            catch: Arc::new(CatchSet::default()),
            namespace: None,
            app_name: None,
            telemetry: Arc::new(NoopTelemetry),
        }
    }

    /// Signal kinds treated as declines.
    pub fn catch(mut self, catch: CatchSet) -> Self {
        self.catch = Arc::new(catch);
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Telemetry for the handlers this resolver contributes.
    ///
    /// When enabled it travels with each candidate, so it also applies when
    /// this resolver is nested in a [`Router`](crate::routing::Router) or an
    /// include. An enabled setting on a more deeply nested resolver wins.
    pub fn telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn patterns(&self) -> &[SharedPattern<Req, Res>] {
        &self.patterns
    }

    pub fn catch_set(&self) -> &CatchSet {
        &self.catch
    }

    pub fn into_shared(self) -> SharedPattern<Req, Res>
    where
        Req: 'static,
        Res: 'static,
    {
        Arc::new(self)
    }

    /// Try every pattern, keeping all matches and the full trail.
    fn collect(&self, path: &str) -> (Vec<MatchCandidate<Req, Res>>, TriedTrail) {
        let mut matched = Vec::new();
        let mut tried = TriedTrail::new();

        for pattern in &self.patterns {
            let description = pattern.describe();
            match pattern.resolve(path) {
                Ok(resolved) => {
                    tracing::trace!(path = %path, pattern = %description, count = resolved.candidates.len(), "Pattern matched");
                    matched.extend(resolved.candidates.into_iter().map(|c| self.adopt(c)));
                    record_trail(&mut tried, description, resolved.tried);
                }
                Err(miss) => record_miss(&mut tried, description, miss),
            }
        }

        (matched, tried)
    }

    fn adopt(&self, mut candidate: MatchCandidate<Req, Res>) -> MatchCandidate<Req, Res> {
        if let Some(namespace) = &self.namespace {
            candidate.info.namespaces.insert(0, namespace.clone());
        }
        if let Some(app_name) = &self.app_name {
            candidate.info.app_name = Some(app_name.clone());
        }
        if candidate.catch.is_none() {
            candidate.catch = Some(Arc::clone(&self.catch));
        }
        if candidate.telemetry.is_none() && self.telemetry.is_enabled() {
            candidate.telemetry = Some(Arc::clone(&self.telemetry));
        }
        candidate
    }
}

impl<Req: 'static, Res: 'static> MultiResolver<Req, Res> {
    /// Resolve `path` against every pattern.
    pub fn resolve(&self, path: &str) -> Result<MultiMatch<Req, Res>, NotFound> {
        let (candidates, tried) = self.collect(path);
        if candidates.is_empty() {
            tracing::debug!(path = %path, tried = tried.len(), "No pattern matched");
            return Err(NotFound::with_tried(path, tried));
        }

        tracing::debug!(path = %path, candidates = candidates.len(), "Resolved candidates");
        Ok(MultiMatch::new(
            candidates,
            path,
            tried,
            Arc::clone(&self.catch),
            Arc::clone(&self.telemetry),
        ))
    }
}

impl<Req, Res> fmt::Debug for MultiResolver<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiResolver")
            .field("patterns", &self.patterns)
            .field("catch", &self.catch)
            .field("namespace", &self.namespace)
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl<Req, Res> Pattern<Req, Res> for MultiResolver<Req, Res> {
    fn describe(&self) -> String {
        let inner = self
            .patterns
            .iter()
            .map(|p| p.describe())
            .collect::<Vec<_>>()
            .join(", ");
        match &self.namespace {
            Some(ns) => format!("multiurl[{}] (namespace='{}')", inner, ns),
            None => format!("multiurl[{}]", inner),
        }
    }

    fn resolve(&self, path: &str) -> ResolveResult<Req, Res> {
        let (candidates, tried) = self.collect(path);
        if candidates.is_empty() {
            Err(NotFound::with_tried(path, tried))
        } else {
            Ok(Resolved::new(candidates, tried))
        }
    }

    fn reverse(&self, name: &str, args: &[String], kwargs: &BTreeMap<String, String>) -> Option<String> {
        let name = unqualify(name, self.namespace.as_deref())?;
        self.patterns
            .iter()
            .find_map(|p| p.reverse(name, args, kwargs))
    }
}
