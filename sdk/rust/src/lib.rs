//! Client for the game-server query gateway.
//!
//! Builds feed requests for either request shape and decodes the envelope
//! the gateway answers with.

pub mod client;
pub mod envelope;

pub use client::{GatewayClient, ServerQuery};
pub use envelope::{decode, FeedResponse, FeedShape, SdkError};
