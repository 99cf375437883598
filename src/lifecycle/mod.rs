//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Build registry → Metrics exporter → Bind listener
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → server stops accepting → in-flight queries finish → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then registry, then listeners
//! - In-flight queries are already bounded by their deadline, so draining
//!   needs no extra timeout

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
