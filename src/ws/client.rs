//! WebSocket client with automatic reconnection

use super::types::{WsConfig, WsError, WsMessage};
use crate::telemetry::{increment, CounterMetric};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// How a single connection ended
enum SessionEnd {
    /// Stop for good: shutdown requested or nobody is listening
    Stop,
    /// Transport failure; `connected` tells whether the handshake had succeeded
    Failed { error: WsError, connected: bool },
}

/// Reusable WebSocket client with reconnection, keepalive pings and a shutdown signal
pub struct WsClient {
    config: WsConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self {
            config,
            shutdown: None,
        }
    }

    /// Create a new client with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(WsConfig::new(url))
    }

    /// Stop the connection loop once the watched value becomes `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connect and return a receiver for messages
    ///
    /// A background task owns the connection, reconnecting with bounded
    /// exponential backoff. Consumer state is untouched across reconnects;
    /// only `Connected` / `Reconnecting` status events are interleaved.
    pub fn connect(&self) -> mpsc::Receiver<WsMessage> {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();
        // Without an external signal the sender lives as long as the task
        let (guard, shutdown) = match self.shutdown.clone() {
            Some(rx) => (None, rx),
            None => {
                let (tx, rx) = watch::channel(false);
                (Some(tx), rx)
            }
        };

        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = Self::run_connection_loop(config, tx, shutdown).await {
                tracing::error!(error = %e, "WebSocket connection loop failed");
            }
        });

        rx
    }

    /// Run the connection loop with automatic reconnection
    async fn run_connection_loop(
        config: WsConfig,
        tx: mpsc::Sender<WsMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), WsError> {
        let mut attempts = 0;
        let mut delay = config.initial_reconnect_delay;

        loop {
            if *shutdown.borrow() {
                break;
            }

            match Self::connect_and_stream(&config, &tx, &mut shutdown).await {
                SessionEnd::Stop => break,
                SessionEnd::Failed { error, connected } => {
                    if connected {
                        attempts = 0;
                        delay = config.initial_reconnect_delay;
                    }
                    attempts += 1;
                    tracing::warn!(
                        error = %error,
                        attempt = attempts,
                        url = %config.url,
                        "WebSocket connection error, reconnecting"
                    );
                    increment(CounterMetric::StreamReconnects);

                    // 0 = infinite
                    if config.max_reconnect_attempts > 0
                        && attempts >= config.max_reconnect_attempts
                    {
                        tracing::error!("Max reconnection attempts reached");
                        let _ = tx.send(WsMessage::Disconnected).await;
                        return Err(WsError::MaxReconnectsExceeded);
                    }

                    if tx.is_closed() {
                        tracing::info!("Receiver dropped, stopping reconnection");
                        break;
                    }

                    let _ = tx.send(WsMessage::Reconnecting { attempt: attempts }).await;

                    let wait = Self::with_jitter(&config, delay);
                    tokio::select! {
                        _ = sleep(wait) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                    delay = config.next_delay(delay);
                }
            }
        }

        let _ = tx.send(WsMessage::Disconnected).await;
        Ok(())
    }

    fn with_jitter(config: &WsConfig, delay: Duration) -> Duration {
        if !config.jitter {
            return delay;
        }
        let max_extra = (delay.as_millis() / 4) as u64;
        if max_extra == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..=max_extra))
    }

    /// Connect to WebSocket and stream messages until failure or stop
    async fn connect_and_stream(
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> SessionEnd {
        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let ws_stream = match connect_async(&config.url).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                return SessionEnd::Failed {
                    error: WsError::ConnectionFailed(e.to_string()),
                    connected: false,
                }
            }
        };
        let (mut write, mut read) = ws_stream.split();

        tracing::info!(url = %config.url, "WebSocket connected");
        if tx.send(WsMessage::Connected).await.is_err() {
            return SessionEnd::Stop;
        }

        let failed = |error: WsError| SessionEnd::Failed {
            error,
            connected: true,
        };

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut waiting_for_pong = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return SessionEnd::Stop;
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            if tx.send(WsMessage::Binary(data)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return SessionEnd::Stop;
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                return failed(WsError::SendFailed(e.to_string()));
                            }
                        }
                        Some(Ok(Message::Pong(_))) => {
                            waiting_for_pong = false;
                        }
                        Some(Ok(Message::Close(_))) => {
                            return failed(WsError::ConnectionFailed("Server sent close frame".into()));
                        }
                        Some(Err(e)) => {
                            return failed(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => {
                            return failed(WsError::ConnectionFailed("Stream ended unexpectedly".into()));
                        }
                        _ => {}
                    }
                }

                _ = ping_interval.tick() => {
                    if waiting_for_pong {
                        return failed(WsError::ConnectionFailed("Pong timeout".into()));
                    }
                    if let Err(e) = write.send(Message::Ping(vec![])).await {
                        return failed(WsError::SendFailed(e.to_string()));
                    }
                    waiting_for_pong = true;
                }

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        let _ = write.send(Message::Close(None)).await;
                        tracing::info!(url = %config.url, "WebSocket shutdown requested");
                        return SessionEnd::Stop;
                    }
                }
            }
        }
    }
}
