//! Per-request routing context.
//!
//! Dispatch records which candidate is currently running on the request
//! itself. The value is request-scoped, so concurrent dispatches never see
//! each other's state.

use crate::routing::pattern::MatchInfo;

/// Request types that can carry the active route during dispatch.
pub trait RoutingContext {
    /// The candidate currently being dispatched, if any.
    fn active_route(&self) -> Option<&MatchInfo>;

    /// Install `route` as the active route and return the previous value.
    fn replace_active_route(&mut self, route: Option<MatchInfo>) -> Option<MatchInfo>;
}

/// Contexts that do not track the active route.
impl RoutingContext for () {
    fn active_route(&self) -> Option<&MatchInfo> {
        None
    }

    fn replace_active_route(&mut self, _route: Option<MatchInfo>) -> Option<MatchInfo> {
        None
    }
}

/// Minimal context that only tracks the active route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSlot {
    active: Option<MatchInfo>,
}

impl RouteSlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoutingContext for RouteSlot {
    fn active_route(&self) -> Option<&MatchInfo> {
        self.active.as_ref()
    }

    fn replace_active_route(&mut self, route: Option<MatchInfo>) -> Option<MatchInfo> {
        std::mem::replace(&mut self.active, route)
    }
}
