//! Protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ProtocolsConfig.enabled
//!     → registry.rs (pick descriptors from the compiled-in catalogue)
//!     → Freeze as immutable ProtocolRegistry (shared via Arc)
//!
//! Per query:
//!     dispatcher opens a Link for the descriptor's transport
//!     → ProtocolPlugin::query (quake3.rs, source.rs)
//!     → ServerStatus (status.rs)
//!     → QueryResult (value.rs), shaped by the requested action
//! ```
//!
//! # Design Decisions
//! - Plugins own wire decoding only; they never open sockets or enforce
//!   deadlines (the dispatcher does both)
//! - Registry is built once; adding a protocol means a rebuild, not a call

pub mod quake3;
pub mod registry;
pub mod source;
pub mod status;
pub mod value;

use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;

use crate::dispatch::Link;
use crate::query::Action;

pub use registry::{ProtocolDescriptor, ProtocolRegistry, RegistryError};
pub use status::ServerStatus;
pub use value::{QueryResult, QueryValue};

/// Errors raised by a protocol plugin while talking to a game server.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Socket send/receive failed (including ICMP port unreachable).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reply could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The reply carried a packet type the exchange did not expect.
    #[error("Unexpected response type 0x{0:02x}")]
    UnexpectedType(u8),
}

/// Transport a protocol speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Udp,
    Tcp,
}

/// Which of the request's ports the dispatcher connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortRole {
    #[default]
    Query,
    Client,
    /// Service port, falling back to the query port when absent.
    Service,
}

/// Everything a plugin needs to know about the server it is querying.
#[derive(Debug, Clone)]
pub struct QueryTarget {
    /// Host as validated (IPv6 literals keep their brackets).
    pub host: String,
    /// Resolved address the link is connected to.
    pub peer: SocketAddr,
    pub client_port: u32,
    pub query_port: u32,
    pub service_port: Option<u32>,
    pub action: Option<Action>,
}

impl QueryTarget {
    /// Whether the caller asked for the section named by `letter`.
    ///
    /// Without an action every section is wanted.
    pub fn wants(&self, letter: char) -> bool {
        self.action.as_ref().map_or(true, |a| a.wants(letter))
    }
}

/// A live-query capability for one protocol family.
#[async_trait]
pub trait ProtocolPlugin: Send + Sync + std::fmt::Debug {
    /// Short family name reported as `gq_protocol`.
    fn family(&self) -> &'static str;

    /// Run one exchange over an already-connected link.
    async fn query(
        &self,
        link: &mut Link,
        target: &QueryTarget,
    ) -> Result<ServerStatus, ProtocolError>;
}
