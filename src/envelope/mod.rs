//! Response envelope encoding.
//!
//! # Wire Format
//! ```text
//! failure:  FAILURE
//! success:  <marker><payload><marker>
//!           Shape A marker: _SGAMEQF_
//!           Shape B marker: _SLGSLF_
//! ```
//!
//! # Design Decisions
//! - The marker comes from `Shape`, so a feed can only ever emit its own
//! - The body is fully built before anything is written; there is no
//!   partial emission
//! - Payload format is a private contract with the calling agent and is
//!   versioned together with it

pub mod php;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::QueryResult;

/// The only failure body the gateway ever emits.
pub const FAILURE: &str = "FAILURE";

/// The two request/response conventions served by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Multi-protocol gateway (`game_type`, normalized results).
    Multi,
    /// Single-library gateway (`lgsl_type` + `request`, raw results).
    Single,
}

impl Shape {
    /// Sentinel wrapped around a successful payload.
    pub const fn marker(self) -> &'static str {
        match self {
            Shape::Multi => "_SGAMEQF_",
            Shape::Single => "_SLGSLF_",
        }
    }

    /// Label used in logs and metrics.
    pub const fn label(self) -> &'static str {
        match self {
            Shape::Multi => "multi",
            Shape::Single => "single",
        }
    }
}

/// Serialization used between the markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// PHP `serialize()` object graph.
    #[default]
    Php,
    /// JSON object.
    Json,
}

/// Error type for payload encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Exactly one envelope is produced per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Failure,
    Payload { shape: Shape, body: String },
}

impl Envelope {
    pub fn is_failure(&self) -> bool {
        matches!(self, Envelope::Failure)
    }

    /// Render the full response body.
    pub fn into_body(self) -> String {
        match self {
            Envelope::Failure => FAILURE.to_string(),
            Envelope::Payload { shape, body } => {
                let marker = shape.marker();
                let mut out = String::with_capacity(body.len() + 2 * marker.len());
                out.push_str(marker);
                out.push_str(&body);
                out.push_str(marker);
                out
            }
        }
    }

    /// Split a response body back into an envelope.
    ///
    /// Returns `None` when the body is neither `FAILURE` nor wrapped in the
    /// markers of `shape`.
    pub fn decode(shape: Shape, text: &str) -> Option<Self> {
        if text == FAILURE {
            return Some(Envelope::Failure);
        }
        let marker = shape.marker();
        let body = text.strip_prefix(marker)?.strip_suffix(marker)?;
        Some(Envelope::Payload {
            shape,
            body: body.to_string(),
        })
    }
}

/// Wraps results into envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    format: PayloadFormat,
}

impl Encoder {
    pub fn new(format: PayloadFormat) -> Self {
        Self { format }
    }

    /// Encode a successful result for `shape`.
    pub fn encode(&self, shape: Shape, result: &QueryResult) -> Result<Envelope, EncodeError> {
        let body = match self.format {
            PayloadFormat::Php => php::to_string(result),
            PayloadFormat::Json => serde_json::to_string(result)?,
        };
        Ok(Envelope::Payload { shape, body })
    }
}
