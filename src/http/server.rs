//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app whose fallback dispatches every request
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve with graceful shutdown
//! - Swap in rebuilt route tables on config reload

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router as AxumRouter,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::request::{HttpContext, UuidRequestId, X_REQUEST_ID};
use crate::http::response::{error_reply, Reply};
use crate::observability::metrics;
use crate::responders::build_router;
use crate::routing::{DispatchError, PatternError, Router};

/// The live route table and the settings that go with it.
pub struct RouteTable {
    pub router: Router<HttpContext, Reply>,
    pub debug_not_found: bool,
}

impl RouteTable {
    pub fn from_config(config: &AppConfig) -> Result<Self, PatternError> {
        Ok(Self {
            router: build_router(config)?,
            debug_not_found: config.listener.debug_not_found,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<ArcSwap<RouteTable>>,
}

impl AppState {
    /// Rebuild the route table from `config` and swap it in.
    ///
    /// On error the current table stays in place.
    pub fn reload(&self, config: &AppConfig) -> Result<(), PatternError> {
        let table = RouteTable::from_config(config)?;
        self.table.store(Arc::new(table));
        tracing::info!(routes = config.routes.len(), "Route table reloaded");
        Ok(())
    }
}

/// HTTP server dispatching requests through a [`Router`].
pub struct HttpServer {
    app: AxumRouter,
    state: AppState,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Result<Self, PatternError> {
        let state = AppState {
            table: Arc::new(ArcSwap::from_pointee(RouteTable::from_config(&config)?)),
        };
        let app = Self::build_app(&config, state.clone());

        Ok(Self { app, state, config })
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &AppConfig, state: AppState) -> AxumRouter {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID));

        AxumRouter::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(middleware)
    }

    /// The Axum app, for serving or for driving directly in tests.
    pub fn app(&self) -> AxumRouter {
        self.app.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configs received on `config_updates` replace the route table.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.config.routes.len(), "HTTP server starting");

        let reload_state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = reload_state.reload(&config) {
                    tracing::error!(error = %e, "Rejected route table, keeping current one");
                }
            }
        });

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Resolve the request path and dispatch through the candidates.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, _body) = request.into_parts();
    let mut ctx = HttpContext::from_parts(&parts);
    let path = ctx.path.clone();

    let table = state.table.load();
    let reply = match table.router.handle(&path, &mut ctx) {
        Ok(reply) => reply,
        Err(err) => {
            match &err {
                DispatchError::NotFound(nf) => {
                    tracing::debug!(request_id = %ctx.request_id, path = %path, tried = nf.tried.len(), "No route produced a response");
                }
                DispatchError::Handler(e) => {
                    tracing::error!(request_id = %ctx.request_id, path = %path, kind = e.kind(), error = %e, "Handler failed");
                }
                DispatchError::UncaughtDecline { handler } => {
                    tracing::error!(request_id = %ctx.request_id, path = %path, handler = %handler, "Decline not accepted by catch set");
                }
            }
            error_reply(&err, table.debug_not_found)
        }
    };

    metrics::record_request(reply.status.as_u16(), start);
    reply.into_response()
}
