//! Game-server query gateway (v1)
//!
//! An HTTP service that answers "what is the live status of game server X"
//! by issuing one bounded UDP/TCP query in the game's native protocol.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                    QUERY GATEWAY                      │
//!                       │                                                       │
//!   GET /gameq_feed     │  ┌─────────┐   ┌───────────┐   ┌──────────────┐      │
//!   GET /lgsl_feed  ────┼─▶│  http   │──▶│   query   │──▶│   dispatch   │──────┼──▶ game server
//!                       │  │ server  │   │ validator │   │  + protocol  │◀─────┼─── (UDP/TCP)
//!                       │  └─────────┘   └───────────┘   │   plugins    │      │
//!                       │       ▲                        └──────┬───────┘      │
//!   FAILURE or          │       │        ┌───────────┐          │              │
//!   marker+payload ◀────┼───────┴────────│ envelope  │◀── normalize (multi)    │
//!                       │                └───────────┘                          │
//!                       │                                                       │
//!                       │  config · observability · lifecycle                   │
//!                       └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use query_gateway::config::loader;
use query_gateway::lifecycle::{signals, startup, Shutdown};
use query_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "query-gateway")]
#[command(about = "HTTP gateway for live game-server status queries", long_about = None)]
struct Args {
    /// Path to a TOML configuration file; defaults apply without one.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = loader::load_or_default(args.config.as_deref())?;
    logging::init(&config.observability)?;

    tracing::info!("query-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        timeout_ms = config.query.timeout_ms,
        max_timeout_ms = config.query.max_timeout_ms,
        payload_format = ?config.encoding.payload_format,
        "Configuration loaded"
    );

    let ready = startup::prepare(config).await?;
    tracing::info!(address = %ready.local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    ready.server.run(ready.listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
