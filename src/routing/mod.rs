//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (root table, first top-level match)
//!     → pattern.rs / resolver.rs (Route, Include, multiurl)
//!     → matcher.rs (path templates, regex)
//!     → Return: MultiMatch (ordered candidates) or NotFound (tried trail)
//!
//! Dispatch:
//!     MultiMatch
//!     → dispatch.rs (candidates in order, active route on the request)
//!     → Respond: stop │ Decline / caught error: next │ other error: propagate
//!     → All declined: NotFound, same shape as a resolution miss
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at startup, immutable at runtime
//! - Overlap is opt-in: only `multiurl` collects more than one match
//! - Deterministic: candidate order is declaration order
//! - Per-request state lives on the request, never in the patterns

pub mod context;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod pattern;
pub mod resolver;
pub mod router;

pub use context::{RouteSlot, RoutingContext};
pub use dispatch::{CatchSet, MultiMatch, CONTINUE_RESOLVING};
pub use error::{DispatchError, HandlerError, NoReverseMatch, NotFound, PatternError, TriedTrail};
pub use handler::{handler_fn, Arguments, Handler, HandlerResult, Outcome};
pub use matcher::{PathMatcher, PathTemplate, RegexPath};
pub use pattern::{
    Include, MatchCandidate, MatchInfo, Pattern, ResolveResult, Resolved, Route, SharedPattern,
};
pub use resolver::{multiurl, MultiResolver};
pub use router::Router;
