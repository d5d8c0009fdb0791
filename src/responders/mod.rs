//! Config-driven route handlers.
//!
//! # Responders
//! - `text`: fixed body
//! - `template`: body rendered from the captured arguments
//! - `lookup`: argument looked up in a table; declines when absent
//! - `reject`: fails with a configured error kind
//!
//! # Templates
//! `{name}` is a keyword argument, `{0}` a positional one. `{value}` is the
//! lookup result, `{path}` and `{request_id}` come from the request.
//! Filters: `{name|title}`, `{name|upper}`, `{name|lower}`. `{{` and `}}`
//! are literal braces.

pub mod build;

use std::collections::BTreeMap;

use axum::http::StatusCode;

use crate::config::schema::{MissingPolicy, ResponderConfig};
use crate::http::request::HttpContext;
use crate::http::response::Reply;
use crate::routing::{Arguments, Handler, HandlerError, HandlerResult, Outcome};

pub use build::build_router;

/// Error kind raised by a `lookup` with `missing = "error"`.
pub const NOT_FOUND_KIND: &str = "not_found";

/// A handler built from a [`ResponderConfig`].
#[derive(Debug, Clone)]
pub struct Responder {
    name: String,
    kind: ResponderKind,
}

#[derive(Debug, Clone)]
enum ResponderKind {
    Text {
        status: StatusCode,
        body: String,
    },
    Template {
        status: StatusCode,
        body: String,
    },
    Lookup {
        param: String,
        entries: BTreeMap<String, String>,
        body: String,
        status: StatusCode,
        missing: MissingPolicy,
    },
    Reject {
        kind: String,
        message: String,
    },
}

impl Responder {
    /// Build a responder; `name` is what logs and telemetry report.
    pub fn from_config(name: impl Into<String>, config: &ResponderConfig) -> Self {
        let kind = match config {
            ResponderConfig::Text { status, body } => ResponderKind::Text {
                status: status_code(*status),
                body: body.clone(),
            },
            ResponderConfig::Template { status, body } => ResponderKind::Template {
                status: status_code(*status),
                body: body.clone(),
            },
            ResponderConfig::Lookup {
                param,
                entries,
                body,
                status,
                missing,
            } => ResponderKind::Lookup {
                param: param.clone(),
                entries: entries.clone(),
                body: body.clone(),
                status: status_code(*status),
                missing: *missing,
            },
            ResponderConfig::Reject { kind, message } => ResponderKind::Reject {
                kind: kind.clone(),
                message: message.clone(),
            },
        };

        Self {
            name: name.into(),
            kind,
        }
    }
}

impl Handler<HttpContext, Reply> for Responder {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, request: &mut HttpContext, arguments: &Arguments) -> HandlerResult<Reply> {
        match &self.kind {
            ResponderKind::Text { status, body } => Ok(Outcome::Respond(Reply::new(*status, body.clone()))),
            ResponderKind::Template { status, body } => {
                let rendered = render(body, request, arguments, None);
                Ok(Outcome::Respond(Reply::new(*status, rendered)))
            }
            ResponderKind::Lookup {
                param,
                entries,
                body,
                status,
                missing,
            } => {
                let found = arguments.get(param).and_then(|key| entries.get(key));
                match (found, missing) {
                    (Some(value), _) => {
                        let rendered = render(body, request, arguments, Some(value));
                        Ok(Outcome::Respond(Reply::new(*status, rendered)))
                    }
                    (None, MissingPolicy::Decline) => {
                        tracing::trace!(responder = %self.name, param = %param, "Lookup miss, declining");
                        Ok(Outcome::Decline)
                    }
                    (None, MissingPolicy::Error) => Err(HandlerError::new(
                        NOT_FOUND_KIND,
                        format!("no entry for {:?}", arguments.get(param).unwrap_or_default()),
                    )),
                }
            }
            ResponderKind::Reject { kind, message } => Err(HandlerError::new(kind.clone(), message.clone())),
        }
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Render a body template.
///
/// Unknown placeholders render as empty strings.
pub fn render(template: &str, request: &HttpContext, arguments: &Arguments, value: Option<&str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(i) = rest.find(['{', '}']) {
        out.push_str(&rest[..i]);
        let tail = &rest[i..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        let Some(end) = tail.find('}') else {
            out.push_str(tail);
            rest = "";
            break;
        };
        let placeholder = &tail[1..end];
        let (key, filter) = match placeholder.split_once('|') {
            Some((key, filter)) => (key.trim(), Some(filter.trim())),
            None => (placeholder.trim(), None),
        };

        let raw = match key {
            "value" if value.is_some() => value.unwrap_or_default(),
            "path" => request.path.as_str(),
            "request_id" => request.request_id.as_str(),
            _ => arguments.get(key).unwrap_or_default(),
        };
        out.push_str(&apply_filter(raw, filter));
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}

fn apply_filter(value: &str, filter: Option<&str>) -> String {
    match filter {
        Some("upper") => value.to_uppercase(),
        Some("lower") => value.to_lowercase(),
        Some("title") => title_case(value),
        _ => value.to_string(),
    }
}

fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut start = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            start = false;
        } else {
            out.push(c);
            start = true;
        }
    }
    out
}
