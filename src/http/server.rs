//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with both feeds and the liveness endpoint
//! - Wire up middleware (concurrency limit, timeout, request ID, tracing)
//! - Bind server to listener and stop on the shutdown broadcast

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::Request,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::envelope::{Envelope, Shape};
use crate::gateway::Gateway;
use crate::http::request::{request_id_of, GatewayRequestId, X_REQUEST_ID};
use crate::http::HEALTH_PATH;
use crate::protocol::{ProtocolRegistry, RegistryError};
use crate::query::{MultiParams, SingleParams};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// HTTP server for the query gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server with the protocols enabled in `config`.
    pub fn new(config: GatewayConfig) -> Result<Self, RegistryError> {
        let registry = ProtocolRegistry::from_config(&config.protocols)?;
        Ok(Self::with_registry(config, Arc::new(registry)))
    }

    /// Create a server over an already built registry.
    pub fn with_registry(config: GatewayConfig, registry: Arc<ProtocolRegistry>) -> Self {
        let state = AppState {
            gateway: Arc::new(Gateway::new(registry, &config)),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.http.multi_path, get(multi_feed))
            .route(&config.http.single_path, get(single_feed))
            .route(HEALTH_PATH, get(health))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.http.request_timeout_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id_of(request),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, GatewayRequestId))
    }

    /// The router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            multi_path = %self.config.http.multi_path,
            single_path = %self.config.http.single_path,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

// A repeated key is a rejection here, so it answers FAILURE rather than
// keeping the last value.
async fn multi_feed(
    State(state): State<AppState>,
    params: Result<Query<MultiParams>, QueryRejection>,
) -> Envelope {
    match params {
        Ok(Query(params)) => state.gateway.serve_multi(&params).await,
        Err(rejection) => state.gateway.reject(Shape::Multi, rejection.body_text()),
    }
}

// Repeated keys answer FAILURE, as in `multi_feed`.
async fn single_feed(
    State(state): State<AppState>,
    params: Result<Query<SingleParams>, QueryRejection>,
) -> Envelope {
    match params {
        Ok(Query(params)) => state.gateway.serve_single(&params).await,
        Err(rejection) => state.gateway.reject(Shape::Single, rejection.body_text()),
    }
}

async fn health() -> &'static str {
    "OK"
}
