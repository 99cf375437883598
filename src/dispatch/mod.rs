//! Query dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! QueryRequest + &ProtocolDescriptor
//!     → dispatcher.rs (pick port, resolve host, start deadline)
//!     → link.rs (open transport)
//!     → ProtocolPlugin::query
//!     → QueryResult or QueryError
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; resolve, connect and exchange share one deadline
//! - Exactly one query per request: no retries, no fan-out
//! - The link lives inside the deadline-bounded future, so it is closed on
//!   every exit path

pub mod dispatcher;
pub mod link;

use std::time::Duration;

use thiserror::Error;

use crate::protocol::ProtocolError;

pub use dispatcher::Dispatcher;
pub use link::Link;

/// Reasons a live query produced no result.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Port {0} cannot be used as a socket port")]
    UnusablePort(u32),

    #[error("Failed to resolve host: {0}")]
    Resolve(#[source] std::io::Error),

    #[error("Host '{0}' resolved to no addresses")]
    NoAddress(String),

    #[error("Failed to connect: {0}")]
    Connect(#[source] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl QueryError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Timeout(_) => "timeout",
            QueryError::UnusablePort(_) => "unusable_port",
            QueryError::Resolve(_) | QueryError::NoAddress(_) => "resolve",
            QueryError::Connect(_) => "connect",
            QueryError::Protocol(_) => "protocol",
        }
    }
}
