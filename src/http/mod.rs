//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, HttpContext)
//!     → routing (resolve, fallthrough dispatch)
//!     → response.rs (Reply, error mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{HttpContext, UuidRequestId, X_REQUEST_ID};
pub use response::{error_reply, Reply};
pub use server::{AppState, HttpServer, RouteTable};
