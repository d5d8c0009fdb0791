//! Handler telemetry.
//!
//! # Responsibilities
//! - Name the current transaction after the handler being dispatched
//! - Time every handler call and record its outcome
//!
//! # Design Decisions
//! - Telemetry is an injected trait object, `NoopTelemetry` by default
//! - Handlers are wrapped in a `TracedHandler` decorator once per resolution;
//!   shared patterns are never mutated

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::routing::handler::{Arguments, Handler, HandlerResult, Outcome};

/// How a handler call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Responded,
    Declined,
    Failed,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Responded => "responded",
            CallOutcome::Declined => "declined",
            CallOutcome::Failed => "failed",
        }
    }

    fn of<Res>(result: &HandlerResult<Res>) -> Self {
        match result {
            Ok(Outcome::Respond(_)) => CallOutcome::Responded,
            Ok(Outcome::Decline) => CallOutcome::Declined,
            Err(_) => CallOutcome::Failed,
        }
    }
}

/// Sink for dispatch telemetry.
pub trait Telemetry: Send + Sync + fmt::Debug {
    /// When false, handlers are not wrapped at all.
    fn is_enabled(&self) -> bool;

    /// Name the current transaction after the handler about to run.
    fn set_transaction_name(&self, name: &str);

    /// Record one finished handler call.
    fn record_call(&self, name: &str, elapsed: Duration, outcome: CallOutcome);
}

/// Telemetry that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn is_enabled(&self) -> bool {
        false
    }

    fn set_transaction_name(&self, _name: &str) {}

    fn record_call(&self, _name: &str, _elapsed: Duration, _outcome: CallOutcome) {}
}

/// Telemetry backed by `tracing` spans and `metrics` histograms.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn is_enabled(&self) -> bool {
        true
    }

    fn set_transaction_name(&self, name: &str) {
        tracing::Span::current().record("transaction", name);
    }

    fn record_call(&self, name: &str, elapsed: Duration, outcome: CallOutcome) {
        tracing::debug!(
            handler = %name,
            outcome = outcome.as_str(),
            elapsed_us = elapsed.as_micros() as u64,
            "Handler finished"
        );
        crate::observability::metrics::record_handler(name, outcome.as_str(), elapsed.as_secs_f64());
    }
}

/// Handler decorator that reports each call to a [`Telemetry`].
pub struct TracedHandler<Req, Res> {
    inner: Arc<dyn Handler<Req, Res>>,
    telemetry: Arc<dyn Telemetry>,
}

impl<Req, Res> TracedHandler<Req, Res> {
    pub fn new(inner: Arc<dyn Handler<Req, Res>>, telemetry: Arc<dyn Telemetry>) -> Self {
        Self { inner, telemetry }
    }
}

impl<Req, Res> fmt::Debug for TracedHandler<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracedHandler")
            .field("inner", &self.inner.name())
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

impl<Req, Res> Handler<Req, Res> for TracedHandler<Req, Res> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&self, request: &mut Req, arguments: &Arguments) -> HandlerResult<Res> {
        let span = tracing::debug_span!("handler", name = %self.inner.name());
        let _enter = span.enter();

        let start = Instant::now();
        let result = self.inner.call(request, arguments);
        self.telemetry
            .record_call(self.inner.name(), start.elapsed(), CallOutcome::of(&result));
        result
    }
}

/// Wrap `handler` so every call is reported to `telemetry`.
pub fn traced<Req: 'static, Res: 'static>(
    handler: Arc<dyn Handler<Req, Res>>,
    telemetry: Arc<dyn Telemetry>,
) -> Arc<dyn Handler<Req, Res>> {
    Arc::new(TracedHandler::new(handler, telemetry))
}
