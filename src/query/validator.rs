//! Request validation.
//!
//! # Responsibilities
//! - Reject missing, out-of-range or malformed parameters
//! - Reduce the host to a single address-like token
//! - Resolve the protocol id against the registry
//!
//! # Check Order
//! ```text
//! 1. required fields (Shape B: also the action)
//! 2. query port in [1024, 99999]
//! 3. host charset  [0-9a-zA-Z.\-\[\]:]
//! 4. host reduction: first "[...]" IPv6 literal, else first [0-9a-zA-Z.-] run
//! 5. Shape B: action charset [a-z]
//! 6. Shape B: reserved protocol id "test"
//! 7. protocol id registered (both shapes); Shape B action letters supported
//! ```
//!
//! # Design Decisions
//! - Short-circuits on the first failing check
//! - Errors carry detail for logs only; callers only ever see FAILURE

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::params::{is_absent, lenient_int, MultiParams, SingleParams};
use super::{Action, QueryRequest};
use crate::protocol::{ProtocolDescriptor, ProtocolRegistry};

/// Lowest accepted query port.
pub const MIN_QUERY_PORT: i64 = 1024;
/// Highest accepted query port.
pub const MAX_QUERY_PORT: i64 = 99_999;

/// Protocol id reserved by the single-library shape.
pub const RESERVED_PROTOCOL: &str = "test";

static HOST_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9a-zA-Z.\-\[\]:]").unwrap());

static BRACKETED_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[[0-9a-z:]+\]").unwrap());

static PLAIN_HOST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[0-9a-z.\-]+").unwrap());

/// Reasons a request is rejected before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required parameter '{0}'")]
    MissingField(&'static str),

    #[error("Query port {0} outside [1024, 99999]")]
    QueryPortOutOfRange(i64),

    #[error("Parameter '{field}' is not a valid port: {value}")]
    MalformedPort { field: &'static str, value: i64 },

    #[error("Host contains disallowed characters")]
    HostCharset,

    #[error("Host reduced to nothing")]
    EmptyHost,

    #[error("Action contains characters outside [a-z]")]
    ActionCharset,

    #[error("Protocol id '{0}' is reserved")]
    ReservedProtocol(String),

    #[error("Unknown protocol id '{0}'")]
    UnknownProtocol(String),

    #[error("Protocol '{protocol}' does not support action '{letter}'")]
    UnsupportedAction { protocol: String, letter: char },
}

impl ValidationError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "missing_field",
            ValidationError::QueryPortOutOfRange(_) => "query_port_range",
            ValidationError::MalformedPort { .. } => "malformed_port",
            ValidationError::HostCharset => "host_charset",
            ValidationError::EmptyHost => "empty_host",
            ValidationError::ActionCharset => "action_charset",
            ValidationError::ReservedProtocol(_) => "reserved_protocol",
            ValidationError::UnknownProtocol(_) => "unknown_protocol",
            ValidationError::UnsupportedAction { .. } => "unsupported_action",
        }
    }
}

/// Validates raw parameters against a registry.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    registry: &'r ProtocolRegistry,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r ProtocolRegistry) -> Self {
        Self { registry }
    }

    /// Validate Shape A parameters.
    pub fn multi(
        &self,
        params: &MultiParams,
    ) -> Result<(QueryRequest, &'r ProtocolDescriptor), ValidationError> {
        let common = Common::check(
            ("game_type", params.game_type.as_deref()),
            params.ip.as_deref(),
            params.c_port.as_deref(),
            params.q_port.as_deref(),
            params.s_port.as_deref(),
        )?;

        let descriptor = self.lookup(&common.protocol)?;
        Ok((common.into_request(None), descriptor))
    }

    /// Validate Shape B parameters.
    pub fn single(
        &self,
        params: &SingleParams,
    ) -> Result<(QueryRequest, &'r ProtocolDescriptor), ValidationError> {
        let raw_action = params.request.as_deref();
        let common = Common::check_with(
            ("lgsl_type", params.lgsl_type.as_deref()),
            params.ip.as_deref(),
            params.c_port.as_deref(),
            params.q_port.as_deref(),
            params.s_port.as_deref(),
            || {
                if is_absent(raw_action) {
                    Err(ValidationError::MissingField("request"))
                } else {
                    Ok(())
                }
            },
        )?;

        let action = Action::parse(raw_action.unwrap_or_default())
            .ok_or(ValidationError::ActionCharset)?;

        if common.protocol == RESERVED_PROTOCOL {
            return Err(ValidationError::ReservedProtocol(common.protocol));
        }

        let descriptor = self.lookup(&common.protocol)?;
        if let Some(letter) = action.letters().find(|&l| !descriptor.supports_action(l)) {
            return Err(ValidationError::UnsupportedAction {
                protocol: common.protocol,
                letter,
            });
        }

        Ok((common.into_request(Some(action)), descriptor))
    }

    fn lookup(&self, protocol: &str) -> Result<&'r ProtocolDescriptor, ValidationError> {
        self.registry
            .get(protocol)
            .ok_or_else(|| ValidationError::UnknownProtocol(protocol.to_string()))
    }
}

/// Fields shared by both shapes, after checks 1-4.
struct Common {
    protocol: String,
    host: String,
    client_port: u32,
    query_port: u32,
    service_port: Option<u32>,
}

impl Common {
    fn check(
        protocol: (&'static str, Option<&str>),
        ip: Option<&str>,
        c_port: Option<&str>,
        q_port: Option<&str>,
        s_port: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Self::check_with(protocol, ip, c_port, q_port, s_port, || Ok(()))
    }

    fn check_with(
        (protocol_field, protocol): (&'static str, Option<&str>),
        ip: Option<&str>,
        c_port: Option<&str>,
        q_port: Option<&str>,
        s_port: Option<&str>,
        extra_required: impl FnOnce() -> Result<(), ValidationError>,
    ) -> Result<Self, ValidationError> {
        // 1. Required fields.
        if is_absent(protocol) {
            return Err(ValidationError::MissingField(protocol_field));
        }
        if is_absent(ip) {
            return Err(ValidationError::MissingField("ip"));
        }
        let client = lenient_int(c_port);
        if client == 0 {
            return Err(ValidationError::MissingField("c_port"));
        }
        let query = lenient_int(q_port);
        if query == 0 {
            return Err(ValidationError::MissingField("q_port"));
        }
        extra_required()?;

        // 2. Query port range.
        if !(MIN_QUERY_PORT..=MAX_QUERY_PORT).contains(&query) {
            return Err(ValidationError::QueryPortOutOfRange(query));
        }

        // 3-4. Host charset, then reduction.
        let host = reduce_host(ip.unwrap_or_default())?;

        let service = match lenient_int(s_port) {
            0 => None,
            value => Some(to_port("s_port", value)?),
        };

        Ok(Self {
            protocol: protocol.unwrap_or_default().to_string(),
            host,
            client_port: to_port("c_port", client)?,
            query_port: to_port("q_port", query)?,
            service_port: service,
        })
    }

    fn into_request(self, action: Option<Action>) -> QueryRequest {
        QueryRequest::new(
            self.protocol,
            self.host,
            self.client_port,
            self.query_port,
            self.service_port,
            action,
        )
    }
}

fn to_port(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    u32::try_from(value).map_err(|_| ValidationError::MalformedPort { field, value })
}

/// Check the host charset and reduce it to one address-like token.
///
/// `"[::1]trailer"` → `"[::1]"`, `"10.0.0.5:9999extra"` → `"10.0.0.5"`.
pub fn reduce_host(raw: &str) -> Result<String, ValidationError> {
    if HOST_DISALLOWED.is_match(raw) {
        return Err(ValidationError::HostCharset);
    }

    let reduced = BRACKETED_HOST
        .find(raw)
        .or_else(|| PLAIN_HOST.find(raw))
        .map(|m| m.as_str())
        .unwrap_or_default();

    if reduced.is_empty() {
        return Err(ValidationError::EmptyHost);
    }
    Ok(reduced.to_string())
}
