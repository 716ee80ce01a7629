//! HTTP transport for the gateway.
//!
//! The transport binds the configured TCP endpoint and serves an axum router
//! that forwards JSON-RPC bodies to the dispatcher.

mod errors;
mod http;
mod listener;

pub use self::errors::ListenerError;
pub use self::http::{HEALTH_PATH, RPC_PATH, router};
pub use self::listener::GatewayListener;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
