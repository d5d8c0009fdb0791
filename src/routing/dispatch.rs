//! Fallthrough dispatch over resolved candidates.
//!
//! # Semantics
//! - Candidates run in declaration order
//! - The first handler that responds wins; later candidates never run
//! - A decline (or a caught error kind) moves on to the next candidate
//! - Any other error propagates unchanged
//! - If everyone declines, dispatch fails with the same `NotFound` a
//!   resolution-time miss would produce
//!
//! The request's active route is saved on entry and restored on exit, whatever
//! the outcome.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::observability::tracing::{traced, Telemetry};
use crate::routing::context::RoutingContext;
use crate::routing::error::{DispatchError, NotFound, TriedTrail};
use crate::routing::handler::Outcome;
use crate::routing::pattern::MatchCandidate;

/// Kind of the built-in decline signal.
pub const CONTINUE_RESOLVING: &str = "continue_resolving";

/// Signal kinds treated as "try the next candidate".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchSet {
    kinds: BTreeSet<String>,
}

impl CatchSet {
    /// Catch exactly the given kinds.
    ///
    /// Leaving out [`CONTINUE_RESOLVING`] makes plain declines an error.
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a kind to the set.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kinds.insert(kind.into());
        self
    }

    pub fn catches(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.iter().map(String::as_str)
    }
}

impl Default for CatchSet {
    fn default() -> Self {
        Self::new([CONTINUE_RESOLVING])
    }
}

/// All candidates that matched one path, dispatched with fallthrough.
pub struct MultiMatch<Req, Res> {
    candidates: Vec<MatchCandidate<Req, Res>>,
    path: String,
    tried: TriedTrail,
    catch: Arc<CatchSet>,
    telemetry: Arc<dyn Telemetry>,
}

impl<Req: 'static, Res: 'static> MultiMatch<Req, Res> {
    /// Bundle resolved candidates.
    ///
    /// Handlers are wrapped once here, with the candidate's own telemetry or
    /// else `telemetry`, whichever is enabled. Dispatching never mutates
    /// shared patterns. An empty match dispatches straight to `NotFound`.
    pub fn new(
        candidates: Vec<MatchCandidate<Req, Res>>,
        path: impl Into<String>,
        tried: TriedTrail,
        catch: Arc<CatchSet>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        let candidates = candidates
            .into_iter()
            .map(|mut c| {
                let active = c.telemetry.as_ref().unwrap_or(&telemetry);
                if active.is_enabled() {
                    c.handler = traced(c.handler, Arc::clone(active));
                }
                c
            })
            .collect();

        Self {
            candidates,
            path: path.into(),
            tried,
            catch,
            telemetry,
        }
    }
}

impl<Req, Res> MultiMatch<Req, Res> {
    pub fn candidates(&self) -> &[MatchCandidate<Req, Res>] {
        &self.candidates
    }

    /// The highest-priority candidate.
    pub fn first(&self) -> Option<&MatchCandidate<Req, Res>> {
        self.candidates.first()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn tried(&self) -> &TriedTrail {
        &self.tried
    }

    pub fn catch(&self) -> &CatchSet {
        &self.catch
    }

    /// The error dispatch reports when every candidate declined.
    pub fn not_found(&self) -> NotFound {
        NotFound::with_tried(self.path.clone(), self.tried.clone())
    }

    pub fn into_candidates(self) -> Vec<MatchCandidate<Req, Res>> {
        self.candidates
    }
}

impl<Req: RoutingContext, Res> MultiMatch<Req, Res> {
    /// Run candidates in order until one responds.
    ///
    /// Safe to call repeatedly; every call starts over from the first
    /// candidate.
    pub fn dispatch(&self, request: &mut Req) -> Result<Res, DispatchError> {
        let span = tracing::debug_span!(
            "dispatch",
            path = %self.path,
            candidates = self.candidates.len(),
            transaction = tracing::field::Empty,
        );
        let _enter = span.enter();
        let start = Instant::now();

        let original = request.replace_active_route(None);
        let result = self.fall_through(request);
        request.replace_active_route(original);

        crate::observability::metrics::record_dispatch(
            self.candidates.len(),
            result.is_ok(),
            start,
        );
        result
    }

    fn fall_through(&self, request: &mut Req) -> Result<Res, DispatchError> {
        for (index, candidate) in self.candidates.iter().enumerate() {
            let handler = candidate.handler.name();
            let catch = candidate.catch.as_deref().unwrap_or(&self.catch);

            request.replace_active_route(Some(candidate.info.clone()));
            candidate
                .telemetry
                .as_ref()
                .unwrap_or(&self.telemetry)
                .set_transaction_name(handler);

            match candidate.handler.call(request, &candidate.info.arguments) {
                Ok(Outcome::Respond(response)) => {
                    tracing::debug!(index, handler, "Candidate responded");
                    return Ok(response);
                }
                Ok(Outcome::Decline) if catch.catches(CONTINUE_RESOLVING) => {
                    tracing::debug!(index, handler, "Candidate declined");
                    crate::observability::metrics::record_decline(handler);
                }
                Ok(Outcome::Decline) => {
                    return Err(DispatchError::UncaughtDecline {
                        handler: handler.to_string(),
                    });
                }
                Err(err) if catch.catches(err.kind()) => {
                    tracing::debug!(index, handler, kind = err.kind(), "Candidate declined with caught error");
                    crate::observability::metrics::record_decline(handler);
                }
                Err(err) => {
                    tracing::debug!(index, handler, error = %err, "Candidate failed");
                    return Err(DispatchError::Handler(err));
                }
            }
        }

        tracing::debug!(path = %self.path, "All candidates declined");
        Err(DispatchError::NotFound(self.not_found()))
    }
}

impl<Req, Res> fmt::Debug for MultiMatch<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiMatch")
            .field("path", &self.path)
            .field("candidates", &self.candidates)
            .field("tried", &self.tried)
            .field("catch", &self.catch)
            .finish()
    }
}
