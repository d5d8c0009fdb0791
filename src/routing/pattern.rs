//! Route patterns: leaf routes, conventional includes, and the candidates
//! they produce.
//!
//! # Design Decisions
//! - Every pattern resolves to a list of candidates so nested multi-resolvers
//!   can surface all of their matches to the parent
//! - Leaf routes and includes keep conventional first-match semantics
//! - A miss with an empty trail means "this pattern itself did not match"

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::observability::tracing::Telemetry;
use crate::routing::dispatch::CatchSet;
use crate::routing::error::{NotFound, PatternError, TriedTrail};
use crate::routing::handler::{Arguments, Handler};
use crate::routing::matcher::{PathMatch, PathMatcher, PathTemplate, RegexPath};

/// Shared handle to a pattern.
pub type SharedPattern<Req, Res> = Arc<dyn Pattern<Req, Res>>;

/// Result of resolving one pattern against a path.
pub type ResolveResult<Req, Res> = Result<Resolved<Req, Res>, NotFound>;

/// Candidates a pattern produced, with the chains it walked to find them.
pub struct Resolved<Req, Res> {
    pub candidates: Vec<MatchCandidate<Req, Res>>,
    /// Chains tried below this pattern. Empty for a leaf.
    pub tried: TriedTrail,
}

impl<Req, Res> Resolved<Req, Res> {
    pub fn new(candidates: Vec<MatchCandidate<Req, Res>>, tried: TriedTrail) -> Self {
        Self { candidates, tried }
    }

    /// A single leaf match with no nested trail.
    pub fn leaf(candidate: MatchCandidate<Req, Res>) -> Self {
        Self::new(vec![candidate], TriedTrail::new())
    }
}

impl<Req, Res> fmt::Debug for Resolved<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("candidates", &self.candidates)
            .field("tried", &self.tried)
            .finish()
    }
}

/// Routing metadata of one candidate, independent of its handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchInfo {
    /// Captured arguments.
    pub arguments: Arguments,
    /// Symbolic route name.
    pub url_name: Option<String>,
    /// Application name of the innermost table that declared one.
    pub app_name: Option<String>,
    /// Namespace chain, outer to inner.
    pub namespaces: Vec<String>,
    /// Description of the pattern chain that produced this match.
    pub route: String,
}

impl MatchInfo {
    /// Namespaces joined with `:`.
    pub fn namespace(&self) -> String {
        self.namespaces.join(":")
    }

    /// Fully qualified view name, e.g. `people:person`.
    pub fn view_name(&self) -> Option<String> {
        let name = self.url_name.as_deref()?;
        if self.namespaces.is_empty() {
            Some(name.to_string())
        } else {
            Some(format!("{}:{}", self.namespace(), name))
        }
    }
}

/// A pattern that matched a path, ready to be dispatched.
pub struct MatchCandidate<Req, Res> {
    pub(crate) info: MatchInfo,
    pub(crate) handler: Arc<dyn Handler<Req, Res>>,
    /// Catch set of the innermost multi-resolver that produced this candidate.
    pub(crate) catch: Option<Arc<CatchSet>>,
    /// Enabled telemetry of the innermost multi-resolver that set one.
    pub(crate) telemetry: Option<Arc<dyn Telemetry>>,
}

impl<Req, Res> MatchCandidate<Req, Res> {
    pub fn new(info: MatchInfo, handler: Arc<dyn Handler<Req, Res>>) -> Self {
        Self {
            info,
            handler,
            catch: None,
            telemetry: None,
        }
    }

    pub fn info(&self) -> &MatchInfo {
        &self.info
    }

    pub fn handler(&self) -> &Arc<dyn Handler<Req, Res>> {
        &self.handler
    }

    pub fn arguments(&self) -> &Arguments {
        &self.info.arguments
    }

    pub fn url_name(&self) -> Option<&str> {
        self.info.url_name.as_deref()
    }

    pub fn namespaces(&self) -> &[String] {
        &self.info.namespaces
    }

    pub fn catch(&self) -> Option<&CatchSet> {
        self.catch.as_deref()
    }

    /// Re-home a candidate found under an include prefix.
    fn nested(
        mut self,
        prefix: &PathMatch,
        prefix_text: &str,
        namespace: Option<&str>,
        app_name: Option<&str>,
    ) -> Self {
        let mut kwargs = prefix.kwargs.clone();
        kwargs.extend(std::mem::take(&mut self.info.arguments.kwargs));
        if kwargs.is_empty() {
            let mut args = prefix.args.clone();
            args.append(&mut self.info.arguments.args);
            self.info.arguments.args = args;
        }
        self.info.arguments.kwargs = kwargs;

        if let Some(namespace) = namespace {
            self.info.namespaces.insert(0, namespace.to_string());
        }
        if let Some(app_name) = app_name {
            self.info.app_name = Some(app_name.to_string());
        }
        self.info.route = format!("{}{}", prefix_text, self.info.route);
        self
    }
}

impl<Req, Res> Clone for MatchCandidate<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            info: self.info.clone(),
            handler: Arc::clone(&self.handler),
            catch: self.catch.clone(),
            telemetry: self.telemetry.clone(),
        }
    }
}

impl<Req, Res> fmt::Debug for MatchCandidate<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchCandidate")
            .field("handler", &self.handler.name())
            .field("info", &self.info)
            .field("catch", &self.catch)
            .field("telemetry", &self.telemetry.is_some())
            .finish()
    }
}

/// A routable entry.
pub trait Pattern<Req, Res>: Send + Sync + fmt::Debug {
    /// Short description used in tried trails.
    fn describe(&self) -> String;

    /// Match `path` and return every candidate this pattern contributes.
    ///
    /// A miss with an empty `tried` trail means the pattern itself did not
    /// match; a non-empty trail comes from a nested table. A hit carries the
    /// nested trail the same way.
    fn resolve(&self, path: &str) -> ResolveResult<Req, Res>;

    /// Build the path for `name`, relative to this pattern.
    fn reverse(
        &self,
        _name: &str,
        _args: &[String],
        _kwargs: &BTreeMap<String, String>,
    ) -> Option<String> {
        None
    }
}

/// Record a sub-pattern on `tried`, flattening the trail it walked.
pub(crate) fn record_trail(tried: &mut TriedTrail, pattern: String, nested: TriedTrail) {
    if nested.is_empty() {
        tried.push(vec![pattern]);
    } else {
        tried.extend(nested.into_iter().map(|chain| {
            let mut full = Vec::with_capacity(chain.len() + 1);
            full.push(pattern.clone());
            full.extend(chain);
            full
        }));
    }
}

/// Record a failed sub-pattern on `tried`.
pub(crate) fn record_miss(tried: &mut TriedTrail, pattern: String, miss: NotFound) {
    record_trail(tried, pattern, miss.tried);
}

/// Strip a namespace qualifier from a view name.
///
/// Names inside a namespaced table are only reachable through it.
pub(crate) fn unqualify<'a>(name: &'a str, namespace: Option<&str>) -> Option<&'a str> {
    match namespace {
        Some(ns) => name.strip_prefix(ns)?.strip_prefix(':'),
        None => Some(name),
    }
}

/// Leaf route: a path expression bound to a handler.
pub struct Route<Req, Res> {
    matcher: Box<dyn PathMatcher>,
    handler: Arc<dyn Handler<Req, Res>>,
    name: Option<String>,
    defaults: BTreeMap<String, String>,
}

impl<Req, Res> Route<Req, Res> {
    pub fn new(matcher: impl PathMatcher + 'static, handler: Arc<dyn Handler<Req, Res>>) -> Self {
        Self {
            matcher: Box::new(matcher),
            handler,
            name: None,
            defaults: BTreeMap::new(),
        }
    }

    /// Route from a brace template that must match the whole remaining path.
    pub fn path(template: &str, handler: Arc<dyn Handler<Req, Res>>) -> Result<Self, PatternError> {
        Ok(Self::new(PathTemplate::endpoint(template)?, handler))
    }

    /// Route from a raw regular expression.
    pub fn regex(source: &str, handler: Arc<dyn Handler<Req, Res>>) -> Result<Self, PatternError> {
        Ok(Self::new(RegexPath::new(source)?, handler))
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Extra keyword arguments passed to the handler; captured values win.
    pub fn defaults(mut self, defaults: BTreeMap<String, String>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn into_shared(self) -> SharedPattern<Req, Res>
    where
        Req: 'static,
        Res: 'static,
    {
        Arc::new(self)
    }
}

impl<Req, Res> fmt::Debug for Route<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("matcher", &self.matcher)
            .field("handler", &self.handler.name())
            .field("name", &self.name)
            .finish()
    }
}

impl<Req, Res> Pattern<Req, Res> for Route<Req, Res> {
    fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("{} [name='{}']", self.matcher.describe(), name),
            None => self.matcher.describe().to_string(),
        }
    }

    fn resolve(&self, path: &str) -> ResolveResult<Req, Res> {
        let Some(found) = self.matcher.match_path(path) else {
            return Err(NotFound::new(path));
        };

        let mut kwargs = self.defaults.clone();
        kwargs.extend(found.kwargs);
        let info = MatchInfo {
            arguments: Arguments::new(found.args, kwargs),
            url_name: self.name.clone(),
            app_name: None,
            namespaces: Vec::new(),
            route: self.matcher.describe().to_string(),
        };
        Ok(Resolved::leaf(MatchCandidate::new(info, Arc::clone(&self.handler))))
    }

    fn reverse(&self, name: &str, args: &[String], kwargs: &BTreeMap<String, String>) -> Option<String> {
        if self.name.as_deref() != Some(name) {
            return None;
        }
        self.matcher.reverse(args, kwargs)
    }
}

/// Conventional nested route table.
///
/// Matches its prefix, then resolves the remainder against its children and
/// returns the candidates of the first child that matches.
pub struct Include<Req, Res> {
    prefix: Box<dyn PathMatcher>,
    patterns: Vec<SharedPattern<Req, Res>>,
    namespace: Option<String>,
    app_name: Option<String>,
}

impl<Req, Res> Include<Req, Res> {
    pub fn new(prefix: impl PathMatcher + 'static, patterns: Vec<SharedPattern<Req, Res>>) -> Self {
        Self {
            prefix: Box::new(prefix),
            patterns,
            namespace: None,
            app_name: None,
        }
    }

    /// Include under a brace-template prefix such as `find/`.
    pub fn path(prefix: &str, patterns: Vec<SharedPattern<Req, Res>>) -> Result<Self, PatternError> {
        Ok(Self::new(PathTemplate::prefix(prefix)?, patterns))
    }

    /// Include under a raw regex prefix such as `^find/`.
    pub fn regex(prefix: &str, patterns: Vec<SharedPattern<Req, Res>>) -> Result<Self, PatternError> {
        Ok(Self::new(RegexPath::new(prefix)?, patterns))
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn patterns(&self) -> &[SharedPattern<Req, Res>] {
        &self.patterns
    }

    pub fn into_shared(self) -> SharedPattern<Req, Res>
    where
        Req: 'static,
        Res: 'static,
    {
        Arc::new(self)
    }
}

impl<Req, Res> fmt::Debug for Include<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Include")
            .field("prefix", &self.prefix)
            .field("patterns", &self.patterns)
            .field("namespace", &self.namespace)
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl<Req, Res> Pattern<Req, Res> for Include<Req, Res> {
    fn describe(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{} (namespace='{}')", self.prefix.describe(), ns),
            None => self.prefix.describe().to_string(),
        }
    }

    fn resolve(&self, path: &str) -> ResolveResult<Req, Res> {
        let Some(prefix) = self.prefix.match_path(path) else {
            return Err(NotFound::new(path));
        };
        let rest = &path[prefix.end..];

        let mut tried = TriedTrail::new();
        for pattern in &self.patterns {
            let description = pattern.describe();
            match pattern.resolve(rest) {
                Ok(resolved) => {
                    record_trail(&mut tried, description, resolved.tried);
                    let candidates = resolved
                        .candidates
                        .into_iter()
                        .map(|c| {
                            c.nested(
                                &prefix,
                                self.prefix.describe(),
                                self.namespace.as_deref(),
                                self.app_name.as_deref(),
                            )
                        })
                        .collect();
                    return Ok(Resolved::new(candidates, tried));
                }
                Err(miss) => record_miss(&mut tried, description, miss),
            }
        }

        tracing::trace!(path = %rest, tried = tried.len(), "Include exhausted");
        Err(NotFound::with_tried(rest, tried))
    }

    fn reverse(&self, name: &str, args: &[String], kwargs: &BTreeMap<String, String>) -> Option<String> {
        let name = unqualify(name, self.namespace.as_deref())?;

        let split = self.prefix.arity().min(args.len());
        let (prefix_args, rest_args) = args.split_at(split);
        let prefix = self.prefix.reverse(prefix_args, kwargs)?;

        self.patterns
            .iter()
            .find_map(|p| p.reverse(name, rest_args, kwargs))
            .map(|tail| format!("{}{}", prefix, tail))
    }
}
