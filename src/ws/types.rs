//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Maximum reconnection attempts before giving up (0 = infinite)
    pub max_reconnect_attempts: u32,
    /// Initial delay before the first reconnection attempt
    pub initial_reconnect_delay: Duration,
    /// Maximum delay between reconnection attempts
    pub max_reconnect_delay: Duration,
    /// Interval between keepalive frames
    pub keepalive_interval: Duration,
    /// Application-level keepalive payload; protocol pings when `None`
    pub keepalive_text: Option<String>,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 0,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            keepalive_interval: Duration::from_secs(30),
            keepalive_text: None,
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set maximum reconnection attempts
    pub fn max_reconnects(mut self, n: u32) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    /// Set initial reconnection delay
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_reconnect_delay = d;
        self
    }

    /// Set maximum reconnection delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_reconnect_delay = d;
        self
    }

    /// Set keepalive interval
    pub fn keepalive_interval(mut self, d: Duration) -> Self {
        self.keepalive_interval = d;
        self
    }

    /// Send this text frame as the keepalive instead of a protocol ping
    ///
    /// APIs that idle-close a connection regardless of protocol pings need
    /// an application-level heartbeat message.
    pub fn keepalive_text(mut self, payload: impl Into<String>) -> Self {
        self.keepalive_text = Some(payload.into());
        self
    }
}

/// Messages surfaced to WebSocket consumers
#[derive(Debug, Clone)]
pub enum WsMessage {
    /// Text frame from the server
    Text(String),
    /// Binary frame from the server
    Binary(Vec<u8>),
    /// Connection established; subscriptions must be replayed
    Connected,
    /// Connection closed for good
    Disconnected,
    /// Reconnecting after a failure
    Reconnecting { attempt: u32 },
}

/// WebSocket transport errors
#[derive(Debug, Clone, Error)]
pub enum WsError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("maximum reconnection attempts exceeded")]
    MaxReconnectsExceeded,

    #[error("send failed: {0}")]
    SendFailed(String),
}
