//! Response type and error mapping.
//!
//! # Responsibilities
//! - Represent responder output independently of axum
//! - Map dispatch failures to HTTP status codes
//!
//! # Design Decisions
//! - "Nothing matched" and "everyone declined" both become 404
//! - Handler failures become 500; their messages are logged, not returned
//! - The tried trail is only exposed when `debug_not_found` is on

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::routing::DispatchError;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// A response produced by a responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
    pub content_type: &'static str,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: TEXT_PLAIN,
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        response
    }
}

/// Turn a failed dispatch into a reply.
pub fn error_reply(err: &DispatchError, debug_not_found: bool) -> Reply {
    match err {
        DispatchError::NotFound(nf) if debug_not_found => Reply::new(
            StatusCode::NOT_FOUND,
            format!("Not Found: {}\n\nTried:\n{}", nf.path, nf.render_tried()),
        ),
        DispatchError::NotFound(_) => Reply::new(StatusCode::NOT_FOUND, "Not Found"),
        DispatchError::Handler(_) | DispatchError::UncaughtDecline { .. } => {
            Reply::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}
