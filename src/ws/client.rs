//! WebSocket client with automatic reconnection
//!
//! One bidirectional connection loop: incoming frames fan out through a
//! channel, outgoing text is queued through a sender, and a keepalive
//! timer emits either a protocol ping or an application-level heartbeat.
//! Consumers see `Connected` after every (re)connect so they can replay
//! their subscriptions.

use super::types::{WsConfig, WsError, WsMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Reusable reconnecting WebSocket client
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Create a new client with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(WsConfig::new(url))
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connect and return a message receiver plus an outgoing-text sender
    ///
    /// Spawns a background task that owns the connection, reconnects with
    /// exponential backoff, and keeps the link alive. Dropping the
    /// receiver tears the connection down.
    pub fn connect(&self) -> (mpsc::Receiver<WsMessage>, mpsc::Sender<String>) {
        let (msg_tx, msg_rx) = mpsc::channel(1024);
        let (send_tx, send_rx) = mpsc::channel(256);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::run_connection_loop(config, msg_tx, send_rx).await {
                tracing::error!(error = %e, "WebSocket connection loop failed");
            }
        });

        (msg_rx, send_tx)
    }

    /// Run the connection loop with automatic reconnection
    async fn run_connection_loop(
        config: WsConfig,
        tx: mpsc::Sender<WsMessage>,
        mut send_rx: mpsc::Receiver<String>,
    ) -> Result<(), WsError> {
        let mut reconnect_attempts = 0;
        let mut reconnect_delay = config.initial_reconnect_delay;

        loop {
            match Self::connect_and_stream(&config, &tx, &mut send_rx).await {
                Ok(()) => {
                    tracing::info!("WebSocket connection closed cleanly");
                    let _ = tx.send(WsMessage::Disconnected).await;
                    break;
                }
                Err(e) => {
                    reconnect_attempts += 1;
                    tracing::warn!(
                        error = %e,
                        attempt = reconnect_attempts,
                        "WebSocket connection error, reconnecting..."
                    );

                    // 0 = retry forever
                    if config.max_reconnect_attempts > 0
                        && reconnect_attempts >= config.max_reconnect_attempts
                    {
                        tracing::error!("Max reconnection attempts reached");
                        let _ = tx.send(WsMessage::Disconnected).await;
                        return Err(WsError::MaxReconnectsExceeded);
                    }

                    if tx.is_closed() {
                        tracing::info!("Receiver dropped, stopping reconnection");
                        break;
                    }

                    let _ = tx
                        .send(WsMessage::Reconnecting {
                            attempt: reconnect_attempts,
                        })
                        .await;

                    sleep(reconnect_delay).await;
                    reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
                }
            }
        }

        Ok(())
    }

    /// Hold one connection open until it drops or the consumer goes away
    async fn connect_and_stream(
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
        send_rx: &mut mpsc::Receiver<String>,
    ) -> Result<(), WsError> {
        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async(&config.url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        tracing::info!("WebSocket connected");

        if tx.send(WsMessage::Connected).await.is_err() {
            return Ok(());
        }

        let mut keepalive = tokio::time::interval(config.keepalive_interval);
        keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        keepalive.reset();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            if tx.send(WsMessage::Binary(data)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Received close frame");
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => {
                            return Err(WsError::ConnectionFailed("stream ended unexpectedly".into()));
                        }
                        _ => {}
                    }
                }

                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            write.send(Message::Text(text)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        None => {
                            // Sender dropped, close connection
                            return Ok(());
                        }
                    }
                }

                _ = keepalive.tick() => {
                    let frame = match &config.keepalive_text {
                        Some(payload) => Message::Text(payload.clone()),
                        None => Message::Ping(vec![]),
                    };
                    write.send(frame).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                }
            }
        }
    }
}
