//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::envelope::PayloadFormat;
use crate::protocol::registry::CATALOGUE;

/// Root configuration for the query gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, concurrency).
    pub listener: ListenerConfig,

    /// HTTP surface (feed paths, request timeout).
    pub http: HttpConfig,

    /// Live query settings.
    pub query: QueryConfig,

    /// Protocols the registry is built from.
    pub protocols: ProtocolsConfig,

    /// Payload encoding.
    pub encoding: EncodingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests served concurrently (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 1024,
        }
    }
}

/// HTTP surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Path serving the multi-protocol feed (Shape A).
    pub multi_path: String,

    /// Path serving the single-library feed (Shape B).
    pub single_path: String,

    /// Outer request timeout in seconds. Must exceed any query deadline.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            multi_path: "/gameq_feed".to_string(),
            single_path: "/lgsl_feed".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Live query configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Default deadline for one query in milliseconds.
    pub timeout_ms: u64,

    /// Ceiling applied to protocol-specific deadlines in milliseconds.
    pub max_timeout_ms: u64,

    /// Largest reply chunk read from a game server.
    pub max_packet_bytes: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            max_timeout_ms: 5000,
            max_packet_bytes: 65_535,
        }
    }
}

/// Protocol selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolsConfig {
    /// Protocol ids to register; each must exist in the built-in catalogue.
    pub enabled: Vec<String>,
}

impl Default for ProtocolsConfig {
    fn default() -> Self {
        Self {
            enabled: CATALOGUE.iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// Payload encoding configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EncodingConfig {
    /// Serialization used between the markers.
    pub payload_format: PayloadFormat,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
