//! Request context and request IDs.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Extract the routing-relevant parts of a request (method, path, query)
//! - Carry the active route while candidates are dispatched
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is not buffered; responders only see the request head

use axum::http::{request::Parts, HeaderMap, HeaderName, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::{MatchInfo, RoutingContext};

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Per-request context handed to responders.
#[derive(Debug, Clone, Default)]
pub struct HttpContext {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub request_id: String,
    active_route: Option<MatchInfo>,
}

impl HttpContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            request_id,
            active_route: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

impl RoutingContext for HttpContext {
    fn active_route(&self) -> Option<&MatchInfo> {
        self.active_route.as_ref()
    }

    fn replace_active_route(&mut self, route: Option<MatchInfo>) -> Option<MatchInfo> {
        std::mem::replace(&mut self.active_route, route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts() {
        let (parts, _) = Request::builder()
            .method(Method::POST)
            .uri("/find/bacon/?page=2")
            .header(X_REQUEST_ID, "req-1")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = HttpContext::from_parts(&parts);
        assert_eq!(ctx.method, Method::POST);
        assert_eq!(ctx.path, "/find/bacon/");
        assert_eq!(ctx.query.as_deref(), Some("page=2"));
        assert_eq!(ctx.request_id, "req-1");
        assert!(ctx.active_route().is_none());
    }

    #[test]
    fn test_uuid_request_id() {
        let request = Request::builder().uri("/").body(()).unwrap();
        let id = UuidRequestId.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }
}
