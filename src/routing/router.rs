//! Root route table.
//!
//! # Responsibilities
//! - Hold the top-level patterns for absolute request paths
//! - Resolve a path to a `MultiMatch` (first matching top-level entry)
//! - Resolve and dispatch in one call
//! - Reverse a view name to an absolute path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Top-level entries keep first-match semantics; overlap is opt-in through
//!   `multiurl`
//! - Explicit `NotFound` rather than silent default

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::observability::tracing::{NoopTelemetry, Telemetry};
use crate::routing::context::RoutingContext;
use crate::routing::dispatch::{CatchSet, MultiMatch};
use crate::routing::error::{DispatchError, NoReverseMatch, NotFound, TriedTrail};
use crate::routing::pattern::{record_miss, record_trail, SharedPattern};

/// The root URL configuration.
pub struct Router<Req, Res> {
    patterns: Vec<SharedPattern<Req, Res>>,
    catch: Arc<CatchSet>,
    telemetry: Arc<dyn Telemetry>,
}

impl<Req, Res> Router<Req, Res> {
    pub fn new(patterns: Vec<SharedPattern<Req, Res>>) -> Self {
        Self {
            patterns,
            catch: Arc::new(CatchSet::default()),
            telemetry: Arc::new(NoopTelemetry),
        }
    }

    /// Catch set for candidates not produced by a nested `multiurl`.
    pub fn with_catch(mut self, catch: CatchSet) -> Self {
        self.catch = Arc::new(catch);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn patterns(&self) -> &[SharedPattern<Req, Res>] {
        &self.patterns
    }

    pub fn telemetry(&self) -> &Arc<dyn Telemetry> {
        &self.telemetry
    }

    /// Build the absolute path for `view_name`, e.g. `people:person`.
    pub fn reverse(
        &self,
        view_name: &str,
        args: &[String],
        kwargs: &BTreeMap<String, String>,
    ) -> Result<String, NoReverseMatch> {
        self.patterns
            .iter()
            .find_map(|p| p.reverse(view_name, args, kwargs))
            .map(|path| format!("/{}", path))
            .ok_or_else(|| NoReverseMatch {
                name: view_name.to_string(),
                args: args.to_vec(),
                kwargs: kwargs.keys().cloned().collect(),
            })
    }
}

impl<Req: 'static, Res: 'static> Router<Req, Res> {
    /// Resolve an absolute path.
    pub fn resolve(&self, path: &str) -> Result<MultiMatch<Req, Res>, NotFound> {
        let Some(rest) = path.strip_prefix('/') else {
            tracing::debug!(path = %path, "Path is not absolute");
            return Err(NotFound::new(path));
        };

        let mut tried = TriedTrail::new();
        for pattern in &self.patterns {
            let description = pattern.describe();
            match pattern.resolve(rest) {
                Ok(resolved) => {
                    record_trail(&mut tried, description, resolved.tried);
                    tracing::debug!(path = %path, candidates = resolved.candidates.len(), "Route resolved");
                    return Ok(MultiMatch::new(
                        resolved.candidates,
                        path,
                        tried,
                        Arc::clone(&self.catch),
                        Arc::clone(&self.telemetry),
                    ));
                }
                Err(miss) => record_miss(&mut tried, description, miss),
            }
        }

        tracing::debug!(path = %path, tried = tried.len(), "No route matched");
        Err(NotFound::with_tried(path, tried))
    }
}

impl<Req: RoutingContext + 'static, Res: 'static> Router<Req, Res> {
    /// Resolve `path` and dispatch `request` through the candidates.
    pub fn handle(&self, path: &str, request: &mut Req) -> Result<Res, DispatchError> {
        let matched = self.resolve(path)?;
        matched.dispatch(request)
    }
}

impl<Req, Res> fmt::Debug for Router<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("patterns", &self.patterns)
            .field("catch", &self.catch)
            .finish()
    }
}
