//! Route handlers and their outcome type.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::routing::error::HandlerError;

/// Arguments captured from the path for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Arguments {
    /// Positional arguments, in capture order.
    pub args: Vec<String>,
    /// Keyword arguments.
    pub kwargs: BTreeMap<String, String>,
}

impl Arguments {
    pub fn new(args: Vec<String>, kwargs: BTreeMap<String, String>) -> Self {
        Self { args, kwargs }
    }

    /// Look up a keyword argument, falling back to a positional index when
    /// `key` is numeric.
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.kwargs.get(key) {
            return Some(value);
        }
        key.parse::<usize>()
            .ok()
            .and_then(|i| self.args.get(i))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}

/// What a handler did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<Res> {
    /// The handler produced a response; dispatch stops here.
    Respond(Res),
    /// The handler does not want this request; try the next candidate.
    Decline,
}

/// Return type of [`Handler::call`].
pub type HandlerResult<Res> = Result<Outcome<Res>, HandlerError>;

/// A callable bound to a route.
pub trait Handler<Req, Res>: Send + Sync {
    /// Qualified name, used for logs and telemetry transaction names.
    fn name(&self) -> &str;

    /// Handle `request` with the arguments captured for this route.
    fn call(&self, request: &mut Req, arguments: &Arguments) -> HandlerResult<Res>;
}

/// Adapter turning a closure into a [`Handler`].
pub struct HandlerFn<F> {
    name: String,
    f: F,
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").field("name", &self.name).finish()
    }
}

impl<Req, Res, F> Handler<Req, Res> for HandlerFn<F>
where
    F: Fn(&mut Req, &Arguments) -> HandlerResult<Res> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, request: &mut Req, arguments: &Arguments) -> HandlerResult<Res> {
        (self.f)(request, arguments)
    }
}

/// Wrap a closure as a shared handler.
///
/// ```
/// use multiroute::routing::{handler_fn, Handler, Outcome};
///
/// let person = handler_fn("views::person", |_req: &mut (), args| {
///     match args.get("0") {
///         Some("jane") => Ok(Outcome::Respond("Person: Jane Doe".to_string())),
///         _ => Ok(Outcome::Decline),
///     }
/// });
/// assert_eq!(person.name(), "views::person");
/// ```
pub fn handler_fn<Req, Res, F>(name: impl Into<String>, f: F) -> Arc<dyn Handler<Req, Res>>
where
    Req: 'static,
    Res: 'static,
    F: Fn(&mut Req, &Arguments) -> HandlerResult<Res> + Send + Sync + 'static,
{
    Arc::new(HandlerFn {
        name: name.into(),
        f,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_lookup() {
        let mut kwargs = BTreeMap::new();
        kwargs.insert("slug".to_string(), "bacon".to_string());
        let arguments = Arguments::new(vec!["first".into()], kwargs);

        assert_eq!(arguments.get("slug"), Some("bacon"));
        assert_eq!(arguments.get("0"), Some("first"));
        assert_eq!(arguments.get("1"), None);
        assert_eq!(arguments.get("missing"), None);
        assert!(!arguments.is_empty());
        assert!(Arguments::default().is_empty());
    }

    #[test]
    fn test_handler_fn_calls_closure() {
        let handler = handler_fn("echo", |req: &mut Vec<String>, args: &Arguments| {
            req.push(args.args.join(","));
            Ok(Outcome::Respond(req.len()))
        });

        let mut seen = Vec::new();
        let arguments = Arguments::new(vec!["a".into(), "b".into()], BTreeMap::new());
        let result = handler.call(&mut seen, &arguments).unwrap();

        assert_eq!(result, Outcome::Respond(1));
        assert_eq!(seen, vec!["a,b".to_string()]);
        assert_eq!(handler.name(), "echo");
    }
}
