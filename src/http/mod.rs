//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, concurrency limit, timeout, tracing)
//!     → request.rs (request ID assigned and propagated)
//!     → feed handler → Gateway
//!     → response.rs (Envelope → 200 text/plain)
//! ```
//!
//! # Design Decisions
//! - Every feed response is HTTP 200; success or failure lives in the body
//! - Malformed query strings are answered with FAILURE, never a 400

pub mod request;
pub mod response;
pub mod server;

pub use request::{GatewayRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

/// Liveness endpoint path.
pub const HEALTH_PATH: &str = "/health";
