//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request path produces:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (request outcomes, query latency)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for aggregation)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request span
//! - Failure variants are logged at debug; the client only ever sees FAILURE
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
