//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, packet sizes)
//! - Check referential integrity (enabled protocols exist in the catalogue)
//! - Detect conflicting feed paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::http::HEALTH_PATH;
use crate::protocol::registry::CATALOGUE;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a socket address")]
    BadAddress { field: &'static str, value: String },

    #[error("{field}: '{value}' must start with '/'")]
    BadPath { field: &'static str, value: String },

    #[error("http paths must be distinct from each other and from /health")]
    PathConflict,

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("query.timeout_ms ({timeout_ms}) exceeds query.max_timeout_ms ({max_timeout_ms})")]
    TimeoutAboveCeiling { timeout_ms: u64, max_timeout_ms: u64 },

    #[error("http.request_timeout_secs must exceed query.max_timeout_ms")]
    RequestTimeoutTooShort,

    #[error("query.max_packet_bytes ({0}) outside [512, 65535]")]
    PacketSize(usize),

    #[error("protocols.enabled: unknown protocol '{0}'")]
    UnknownProtocol(String),

    #[error("protocols.enabled: '{0}' listed more than once")]
    DuplicateProtocol(String),

    #[error("protocols.enabled must not be empty")]
    NoProtocols,

    #[error("observability.log_format: '{0}' is not 'pretty' or 'json'")]
    LogFormat(String),
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_connections" });
    }

    let http = &config.http;
    check_path(&mut errors, "http.multi_path", &http.multi_path);
    check_path(&mut errors, "http.single_path", &http.single_path);
    if http.multi_path == http.single_path
        || http.multi_path == HEALTH_PATH
        || http.single_path == HEALTH_PATH
    {
        errors.push(ValidationError::PathConflict);
    }

    let query = &config.query;
    if query.timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "query.timeout_ms" });
    }
    if query.timeout_ms > query.max_timeout_ms {
        errors.push(ValidationError::TimeoutAboveCeiling {
            timeout_ms: query.timeout_ms,
            max_timeout_ms: query.max_timeout_ms,
        });
    }
    if http.request_timeout_secs.saturating_mul(1000) <= query.max_timeout_ms {
        errors.push(ValidationError::RequestTimeoutTooShort);
    }
    if !(512..=65_535).contains(&query.max_packet_bytes) {
        errors.push(ValidationError::PacketSize(query.max_packet_bytes));
    }

    if config.protocols.enabled.is_empty() {
        errors.push(ValidationError::NoProtocols);
    }
    let mut seen = HashSet::new();
    for id in &config.protocols.enabled {
        if !CATALOGUE.contains(&id.as_str()) {
            errors.push(ValidationError::UnknownProtocol(id.clone()));
        } else if !seen.insert(id.as_str()) {
            errors.push(ValidationError::DuplicateProtocol(id.clone()));
        }
    }

    let format = config.observability.log_format.as_str();
    if format != "pretty" && format != "json" {
        errors.push(ValidationError::LogFormat(format.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress { field, value: value.to_string() });
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::BadPath { field, value: value.to_string() });
    }
}
