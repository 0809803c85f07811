//! WebSocket transport
//!
//! Reusable reconnecting WebSocket client with exponential backoff and
//! application-level keepalive.

mod client;
mod types;

pub use client::WsClient;
pub use types::{WsConfig, WsError, WsMessage};
