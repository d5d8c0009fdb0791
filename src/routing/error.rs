//! Error types shared by resolution and dispatch.

use thiserror::Error;

/// Pattern chains attempted while resolving a path, outer pattern first.
///
/// Each entry is the list of pattern descriptions walked to reach the
/// innermost pattern that was tried.
pub type TriedTrail = Vec<Vec<String>>;

/// Boxed error type carried as the source of a [`HandlerError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// No route produced a response for a path.
///
/// Raised both when nothing matched at resolution time and when every
/// matching candidate declined at dispatch time. The two cases are
/// deliberately indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no route found for path {path:?} ({} patterns tried)", .tried.len())]
pub struct NotFound {
    /// The path (or remaining path, for nested tables) that failed.
    pub path: String,
    /// Diagnostic trail of attempted patterns.
    pub tried: TriedTrail,
}

impl NotFound {
    /// A miss with no nested trail (a leaf pattern that did not match).
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tried: Vec::new(),
        }
    }

    /// A miss carrying the trail collected by a nested table.
    pub fn with_tried(path: impl Into<String>, tried: TriedTrail) -> Self {
        Self {
            path: path.into(),
            tried,
        }
    }

    /// Render the trail one chain per line, e.g. `find/ > {name}/`.
    pub fn render_tried(&self) -> String {
        self.tried
            .iter()
            .map(|chain| chain.join(" > "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Failure raised by a route handler.
///
/// Every error has a `kind`. Kinds listed in a resolver's catch set are
/// treated as declines instead of failures.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct HandlerError {
    kind: String,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl HandlerError {
    /// Create an error of the given kind.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// The built-in "not my request" signal, in error form.
    pub fn continue_resolving() -> Self {
        Self::new(
            crate::routing::dispatch::CONTINUE_RESOLVING,
            "handler declined the request",
        )
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by [`MultiMatch::dispatch`](crate::routing::MultiMatch::dispatch).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Every candidate declined.
    #[error(transparent)]
    NotFound(#[from] NotFound),

    /// A handler failed with an error kind that is not caught.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// A handler declined, but declining is not in the catch set.
    #[error("handler {handler} declined but the catch set does not accept declines")]
    UncaughtDecline { handler: String },
}

/// Reverse lookup found no route for a view name and arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("reverse for {name:?} with arguments {args:?} and keyword arguments {kwargs:?} not found")]
pub struct NoReverseMatch {
    pub name: String,
    pub args: Vec<String>,
    pub kwargs: Vec<String>,
}

/// A path template or regex could not be compiled.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern length {length} exceeds maximum of {max} bytes")]
    TooLong { length: usize, max: usize },

    #[error("unterminated parameter in pattern {0:?}")]
    Unterminated(String),

    #[error("invalid parameter name {name:?} in pattern {pattern:?}")]
    InvalidParameter { pattern: String, name: String },

    #[error("duplicate parameter {name:?} in pattern {pattern:?}")]
    DuplicateParameter { pattern: String, name: String },

    #[error("unknown converter {converter:?} in pattern {pattern:?}")]
    UnknownConverter { pattern: String, converter: String },

    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = NotFound::with_tried(
            "/x/",
            vec![vec!["a".into()], vec!["b".into(), "c".into()]],
        );
        assert_eq!(
            err.to_string(),
            "no route found for path \"/x/\" (2 patterns tried)"
        );
        assert_eq!(err.render_tried(), "a\nb > c");
    }

    #[test]
    fn test_handler_error_kind() {
        let err = HandlerError::new("permission_denied", "nope");
        assert_eq!(err.kind(), "permission_denied");
        assert_eq!(err.to_string(), "permission_denied: nope");

        let cont = HandlerError::continue_resolving();
        assert_eq!(cont.kind(), crate::routing::dispatch::CONTINUE_RESOLVING);
    }

    #[test]
    fn test_handler_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err = HandlerError::new("io", "read failed").with_source(io);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk"));
    }

    #[test]
    fn test_dispatch_error_is_transparent() {
        let err: DispatchError = NotFound::new("/y/").into();
        assert!(err.to_string().contains("/y/"));
    }
}
