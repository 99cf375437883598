//! Game-server query gateway library.

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod normalize;
pub mod observability;
pub mod protocol;
pub mod query;

pub use config::schema::GatewayConfig;
pub use envelope::{Envelope, Shape};
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
