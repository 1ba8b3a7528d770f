//! Gateway: HTTP surface of the relay.
//!
//! Single port serves the liveness probe and the webhook (GET handshake, POST events).
//! Handlers run per request with no shared mutable state.

mod error;
mod server;

pub use error::WebhookError;
pub use server::{build_router, run_gateway, GatewayState, HandshakeQuery};
