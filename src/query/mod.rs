//! Query request subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP query string
//!     → params.rs (raw MultiParams / SingleParams, lenient integers)
//!     → validator.rs (ordered checks, host reduction, registry lookup)
//!     → QueryRequest (validated, immutable) + &ProtocolDescriptor
//! ```
//!
//! # Design Decisions
//! - Only the validator can build a `QueryRequest`; holding one proves the
//!   checks ran
//! - Both request shapes share host and port handling

pub mod params;
pub mod validator;

pub use params::{MultiParams, SingleParams};
pub use validator::{ValidationError, Validator};

/// Lowercase action letters requested by a Shape B caller (e.g. `"sep"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action(String);

impl Action {
    /// Parse an action; only non-empty `[a-z]+` is accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_lowercase()) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars()
    }

    pub fn wants(&self, letter: char) -> bool {
        self.0.contains(letter)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request that passed every validation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    protocol: String,
    host: String,
    client_port: u32,
    query_port: u32,
    service_port: Option<u32>,
    action: Option<Action>,
}

impl QueryRequest {
    pub(crate) fn new(
        protocol: String,
        host: String,
        client_port: u32,
        query_port: u32,
        service_port: Option<u32>,
        action: Option<Action>,
    ) -> Self {
        Self {
            protocol,
            host,
            client_port,
            query_port,
            service_port,
            action,
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Reduced host: a bracketed IPv6 literal, an IPv4 address or a hostname.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn client_port(&self) -> u32 {
        self.client_port
    }

    pub fn query_port(&self) -> u32 {
        self.query_port
    }

    pub fn service_port(&self) -> Option<u32> {
        self.service_port
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }
}
