//! Request pipeline shared by both feeds.
//!
//! # Data Flow
//! ```text
//! MultiParams / SingleParams
//!     → Validator (reject early, no network activity)
//!     → Dispatcher (one bounded live query)
//!     → Normalizer (multi feed only)
//!     → Encoder
//!     → Envelope (FAILURE or marker-wrapped payload)
//! ```
//!
//! Every error is collapsed into `Envelope::Failure` here; the variant only
//! reaches logs and metrics.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::config::GatewayConfig;
use crate::dispatch::{Dispatcher, QueryError};
use crate::envelope::{EncodeError, Encoder, Envelope, Shape};
use crate::normalize::Normalizer;
use crate::observability::metrics;
use crate::protocol::{ProtocolDescriptor, ProtocolRegistry, QueryResult, QueryValue};
use crate::query::{MultiParams, QueryRequest, SingleParams, ValidationError, Validator};

/// Any reason a feed request ends in `FAILURE`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    #[error("Encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Malformed query string: {0}")]
    QueryString(String),
}

impl GatewayError {
    /// Outcome label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Validation(e) => e.kind(),
            GatewayError::Query(e) => e.kind(),
            GatewayError::Encode(_) => "encode",
            GatewayError::QueryString(_) => "query_string",
        }
    }
}

/// The query gateway: validation, dispatch, normalization and encoding.
#[derive(Debug, Clone)]
pub struct Gateway {
    registry: Arc<ProtocolRegistry>,
    dispatcher: Dispatcher,
    normalizer: Normalizer,
    encoder: Encoder,
}

impl Gateway {
    pub fn new(registry: Arc<ProtocolRegistry>, config: &GatewayConfig) -> Self {
        Self {
            registry,
            dispatcher: Dispatcher::new(config.query.clone()),
            normalizer: Normalizer::default(),
            encoder: Encoder::new(config.encoding.payload_format),
        }
    }

    /// Serve one multi-protocol request.
    pub async fn serve_multi(&self, params: &MultiParams) -> Envelope {
        let started = Instant::now();
        let outcome = self.run_multi(params).await;
        self.finish(Shape::Multi, outcome, started)
    }

    /// Serve one single-library request.
    pub async fn serve_single(&self, params: &SingleParams) -> Envelope {
        let started = Instant::now();
        let outcome = self.run_single(params).await;
        self.finish(Shape::Single, outcome, started)
    }

    /// Record a request rejected before its parameters could be read.
    pub fn reject(&self, shape: Shape, reason: String) -> Envelope {
        self.finish(shape, Err(GatewayError::QueryString(reason)), Instant::now())
    }

    async fn run_multi(&self, params: &MultiParams) -> Result<Envelope, GatewayError> {
        let (request, descriptor) = Validator::new(&self.registry).multi(params)?;
        let mut result = self
            .dispatcher
            .dispatch(Shape::Multi, &request, descriptor)
            .await?;
        annotate(&mut result, &request, descriptor);
        let result = self.normalizer.normalize(&result);
        Ok(self.encoder.encode(Shape::Multi, &result)?)
    }

    async fn run_single(&self, params: &SingleParams) -> Result<Envelope, GatewayError> {
        let (request, descriptor) = Validator::new(&self.registry).single(params)?;
        let mut result = self
            .dispatcher
            .dispatch(Shape::Single, &request, descriptor)
            .await?;
        result.insert("b".to_string(), basic_section(&request, descriptor));
        Ok(self.encoder.encode(Shape::Single, &result)?)
    }

    fn finish(
        &self,
        shape: Shape,
        outcome: Result<Envelope, GatewayError>,
        started: Instant,
    ) -> Envelope {
        match outcome {
            Ok(envelope) => {
                metrics::record_request(shape, metrics::OUTCOME_OK, started);
                envelope
            }
            Err(e) => {
                tracing::debug!(
                    shape = shape.label(),
                    kind = e.kind(),
                    error = %e,
                    "Request failed"
                );
                metrics::record_request(shape, e.kind(), started);
                Envelope::Failure
            }
        }
    }
}

/// Target details added to every multi-protocol result.
fn annotate(result: &mut QueryResult, request: &QueryRequest, descriptor: &ProtocolDescriptor) {
    let mut put = |key: &str, value: QueryValue| {
        result.insert(key.to_string(), value);
    };
    put("gq_address", request.host().into());
    put("gq_port_client", request.client_port().into());
    put("gq_port_query", request.query_port().into());
    if let Some(port) = request.service_port() {
        put("gq_port_service", port.into());
    }
    put("gq_type", descriptor.id().into());
    put("gq_name", descriptor.name().into());
    put("gq_protocol", descriptor.plugin().family().into());
    put("gq_online", true.into());
}

/// The `b` section of a single-library result: what was asked and whether
/// the server answered. Absent service ports read as 0.
fn basic_section(request: &QueryRequest, descriptor: &ProtocolDescriptor) -> QueryValue {
    let mut basic = QueryResult::new();
    basic.insert("type".to_string(), descriptor.id().into());
    basic.insert("ip".to_string(), request.host().into());
    basic.insert("c_port".to_string(), request.client_port().into());
    basic.insert("q_port".to_string(), request.query_port().into());
    basic.insert("s_port".to_string(), request.service_port().unwrap_or(0).into());
    basic.insert("status".to_string(), 1u8.into());
    QueryValue::Map(basic)
}
