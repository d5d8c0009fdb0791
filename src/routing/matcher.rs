//! Path matching logic.
//!
//! # Responsibilities
//! - Match a (remaining) request path against a single route expression
//! - Extract positional and keyword arguments
//! - Generate paths back from arguments (reverse lookup)
//!
//! # Design Decisions
//! - Two syntaxes: brace templates (`users/{id:int}/`) and raw regexes
//! - Templates are anchored at the start; endpoint templates also at the end
//! - Raw regexes are searched as written, so anchoring is up to the author
//! - Template and compiled regex sizes are bounded to keep matching cheap

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::routing::error::PatternError;

/// Maximum accepted length of a template or regex source, in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum compiled regex size, in bytes.
const MAX_REGEX_SIZE: usize = 1 << 20;

/// Result of matching a path expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMatch {
    /// Byte offset where the match ended; the remainder is passed to nested tables.
    pub end: usize,
    /// Positional captures.
    pub args: Vec<String>,
    /// Named captures.
    pub kwargs: BTreeMap<String, String>,
}

/// Trait for matching paths against a route expression.
pub trait PathMatcher: Send + Sync + fmt::Debug {
    /// Match `path`, returning the captured arguments on success.
    fn match_path(&self, path: &str) -> Option<PathMatch>;

    /// Build a path from arguments. Returns `None` when this expression cannot
    /// be reversed with the given arguments.
    fn reverse(&self, args: &[String], kwargs: &BTreeMap<String, String>) -> Option<String>;

    /// Number of parameters consumed when reversing with positional arguments.
    fn arity(&self) -> usize;

    /// Source text, used in diagnostics.
    fn describe(&self) -> &str;
}

/// Value converters available in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// One non-empty path segment (default).
    Str,
    /// Decimal digits.
    Int,
    /// ASCII letters, digits, hyphens and underscores.
    Slug,
    /// Rest of the path, slashes included.
    Path,
}

impl Converter {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "" | "str" => Some(Converter::Str),
            "int" => Some(Converter::Int),
            "slug" => Some(Converter::Slug),
            "path" | "*" => Some(Converter::Path),
            _ => None,
        }
    }

    fn regex(self) -> &'static str {
        match self {
            Converter::Str => "[^/]+",
            Converter::Int => "[0-9]+",
            Converter::Slug => "[-a-zA-Z0-9_]+",
            Converter::Path => ".+",
        }
    }

    /// Whether `value` could have been captured by this converter.
    fn accepts(self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self {
            Converter::Str => !value.contains('/'),
            Converter::Int => value.bytes().all(|b| b.is_ascii_digit()),
            Converter::Slug => value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'),
            Converter::Path => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, converter: Converter },
}

/// Brace template such as `articles/{year:int}/{slug}/`.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    template: String,
    regex: Regex,
    segments: Vec<Segment>,
    endpoint: bool,
}

impl PathTemplate {
    /// Template that must match the whole remaining path (a route).
    pub fn endpoint(template: &str) -> Result<Self, PatternError> {
        Self::compile(template, true)
    }

    /// Template that matches a leading prefix (an include).
    pub fn prefix(template: &str) -> Result<Self, PatternError> {
        Self::compile(template, false)
    }

    fn compile(template: &str, endpoint: bool) -> Result<Self, PatternError> {
        if template.len() > MAX_PATTERN_LENGTH {
            return Err(PatternError::TooLong {
                length: template.len(),
                max: MAX_PATTERN_LENGTH,
            });
        }

        let segments = parse_template(template)?;
        let mut source = String::from("^");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                Segment::Param { name, converter } => {
                    source.push_str(&format!("(?P<{}>{})", name, converter.regex()));
                }
            }
        }
        if endpoint {
            source.push('$');
        }

        let regex = RegexBuilder::new(&source)
            .size_limit(MAX_REGEX_SIZE)
            .build()?;

        Ok(Self {
            template: template.to_string(),
            regex,
            segments,
            endpoint,
        })
    }

    /// Parameter names in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn is_endpoint(&self) -> bool {
        self.endpoint
    }
}

impl PathMatcher for PathTemplate {
    fn match_path(&self, path: &str) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;
        let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let kwargs = self
            .param_names()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();

        Some(PathMatch {
            end,
            args: Vec::new(),
            kwargs,
        })
    }

    fn reverse(&self, args: &[String], kwargs: &BTreeMap<String, String>) -> Option<String> {
        if !args.is_empty() && !kwargs.is_empty() {
            return None;
        }
        if !args.is_empty() && args.len() != self.arity() {
            return None;
        }

        let mut positional = args.iter();
        let mut out = String::with_capacity(self.template.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param { name, converter } => {
                    let value = if args.is_empty() {
                        kwargs.get(name)?
                    } else {
                        positional.next()?
                    };
                    if !converter.accepts(value) {
                        return None;
                    }
                    out.push_str(value);
                }
            }
        }
        Some(out)
    }

    fn arity(&self) -> usize {
        self.param_names().count()
    }

    fn describe(&self) -> &str {
        &self.template
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>, PatternError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut seen = HashSet::new();
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        if c != '{' {
            literal.push(c);
            continue;
        }

        let mut body = String::new();
        let mut closed = false;
        for next in chars.by_ref() {
            if next == '}' {
                closed = true;
                break;
            }
            body.push(next);
        }
        if !closed {
            return Err(PatternError::Unterminated(template.to_string()));
        }

        let (name, converter_name) = match body.split_once(':') {
            Some((name, converter)) => (name, converter),
            None => (body.as_str(), ""),
        };
        if !is_valid_param_name(name) {
            return Err(PatternError::InvalidParameter {
                pattern: template.to_string(),
                name: name.to_string(),
            });
        }
        let converter = Converter::from_name(converter_name).ok_or_else(|| {
            PatternError::UnknownConverter {
                pattern: template.to_string(),
                converter: converter_name.to_string(),
            }
        })?;
        if !seen.insert(name.to_string()) {
            return Err(PatternError::DuplicateParameter {
                pattern: template.to_string(),
                name: name.to_string(),
            });
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Param {
            name: name.to_string(),
            converter,
        });
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Raw regular expression such as `^(\w+)/$`.
///
/// Named groups become keyword arguments. When no named group matched, every
/// group is passed positionally instead.
#[derive(Debug, Clone)]
pub struct RegexPath {
    source: String,
    regex: Regex,
    /// Reverse template; `None` when the expression is not a plain sequence
    /// of literals and groups.
    pieces: Option<Vec<RegexPiece>>,
}

#[derive(Debug, Clone)]
enum RegexPiece {
    Literal(String),
    Group { name: Option<String>, accepts: Regex },
}

impl RegexPath {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        if source.len() > MAX_PATTERN_LENGTH {
            return Err(PatternError::TooLong {
                length: source.len(),
                max: MAX_PATTERN_LENGTH,
            });
        }
        let regex = RegexBuilder::new(source)
            .size_limit(MAX_REGEX_SIZE)
            .build()?;
        Ok(Self {
            source: source.to_string(),
            pieces: reverse_pieces(source),
            regex,
        })
    }
}

/// Split a regex into literals and groups for reversing.
///
/// Supports `^`/`$` anchors, escaped punctuation, and capturing groups
/// without nested groups. Anything else makes the expression irreversible.
fn reverse_pieces(source: &str) -> Option<Vec<RegexPiece>> {
    let body = source.strip_prefix('^').unwrap_or(source);
    let body = match body.strip_suffix('$') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => body,
    };

    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(e) if !e.is_ascii_alphanumeric() => literal.push(e),
                _ => return None,
            },
            '(' => {
                let name = if chars.peek() == Some(&'?') {
                    chars.next();
                    if chars.peek() == Some(&'P') {
                        chars.next();
                    }
                    if chars.next() != Some('<') {
                        return None;
                    }
                    let name: String = chars.by_ref().take_while(|&c| c != '>').collect();
                    Some(name)
                } else {
                    None
                };

                let mut inner = String::new();
                let mut in_class = false;
                loop {
                    match chars.next()? {
                        '\\' => {
                            inner.push('\\');
                            inner.push(chars.next()?);
                        }
                        '[' => {
                            in_class = true;
                            inner.push('[');
                        }
                        ']' => {
                            in_class = false;
                            inner.push(']');
                        }
                        '(' if !in_class => return None,
                        ')' if !in_class => break,
                        other => inner.push(other),
                    }
                }

                let accepts = Regex::new(&format!("^(?:{})$", inner)).ok()?;
                if !literal.is_empty() {
                    pieces.push(RegexPiece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(RegexPiece::Group { name, accepts });
            }
            '.' | '*' | '+' | '?' | '[' | ']' | '{' | '}' | '|' | ')' | '^' | '$' => return None,
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        pieces.push(RegexPiece::Literal(literal));
    }
    Some(pieces)
}

impl PathMatcher for RegexPath {
    fn match_path(&self, path: &str) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;
        let end = caps.get(0).map(|m| m.end()).unwrap_or(0);

        let kwargs: BTreeMap<String, String> = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();
        let args = if kwargs.is_empty() {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .collect()
        } else {
            Vec::new()
        };

        Some(PathMatch { end, args, kwargs })
    }

    fn reverse(&self, args: &[String], kwargs: &BTreeMap<String, String>) -> Option<String> {
        let pieces = self.pieces.as_ref()?;
        let named = pieces
            .iter()
            .any(|p| matches!(p, RegexPiece::Group { name: Some(_), .. }));
        // Named groups reverse from kwargs only, positional groups from args only.
        if (named && !args.is_empty()) || (!named && args.len() != self.arity()) {
            return None;
        }

        let mut positional = args.iter();
        let mut out = String::new();
        for piece in pieces {
            match piece {
                RegexPiece::Literal(text) => out.push_str(text),
                RegexPiece::Group { name, accepts } => {
                    let value = match name {
                        Some(name) => kwargs.get(name)?,
                        None if named => return None,
                        None => positional.next()?,
                    };
                    if !accepts.is_match(value) {
                        return None;
                    }
                    out.push_str(value);
                }
            }
        }

        self.regex.is_match(&out).then_some(out)
    }

    fn arity(&self) -> usize {
        self.regex.captures_len().saturating_sub(1)
    }

    fn describe(&self) -> &str {
        &self.source
    }
}
