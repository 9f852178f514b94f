//! # Connection Manager
//!
//! Keeps a push channel to the webserver's `/ws` endpoint alive for as long
//! as the viewer runs.
//!
//! ## Lifecycle
//! `Disconnected → Connecting → Connected → Disconnected → …`
//!
//! A single task ([`ConnectionManager::run`]) owns the loop. After every
//! close, read error or failed handshake it waits a fixed delay (3 s by
//! default) and dials again. There is no backoff growth, no jitter and no
//! retry cap; the loop only ends when the stop signal flips to `true`.
//!
//! The client never sends data frames. Text frames go to a [`FrameHandler`];
//! a handler error is logged and the socket stays open.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use crate::error::{LiveViewError, Result};

/// Delay between a close and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Path of the push endpoint on the webserver.
pub const SOCKET_PATH: &str = "/ws";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Receives the server's text frames, one at a time, in arrival order.
pub trait FrameHandler {
    /// Handle one text frame. An error is logged by the caller; the
    /// connection is kept.
    fn on_text(&mut self, text: &str) -> Result<()>;

    fn on_open(&mut self) {}

    fn on_close(&mut self) {}
}

/// Derive the socket URL from the page origin: `https` pages use `wss`,
/// everything else `ws`. Host and port come from `page_url`.
///
/// # Errors
/// [`LiveViewError::InvalidUrl`] when `page_url` is not an absolute URL with
/// a host.
pub fn socket_url(page_url: &str) -> Result<String> {
    let invalid = |detail: &str| LiveViewError::InvalidUrl {
        url: page_url.to_string(),
        detail: detail.to_string(),
    };
    let uri = page_url
        .parse::<Uri>()
        .map_err(|e| invalid(&e.to_string()))?;
    let scheme = match uri.scheme_str() {
        Some(s) if s.eq_ignore_ascii_case("https") || s.eq_ignore_ascii_case("wss") => "wss",
        Some(_) => "ws",
        None => return Err(invalid("missing scheme")),
    };
    let host = uri.authority().ok_or_else(|| invalid("missing host"))?;
    Ok(format!("{scheme}://{host}{SOCKET_PATH}"))
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Full socket URL, e.g. `ws://camera.local:8080/ws`.
    pub url: String,
    pub reconnect_delay: Duration,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

enum SessionEnd {
    /// The server closed the socket or the stream ended.
    Closed,
    Stopped,
}

enum SessionEvent {
    Frame(Option<std::result::Result<WsMessage, tokio_tungstenite::tungstenite::Error>>),
    Stop,
}

/// Owns the socket and reconnects after a fixed delay until stopped.
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self { config, state }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(from = %prev, to = %next, "connection state");
        }
    }

    /// Run the reconnect loop until `stop` reads `true`.
    ///
    /// Returns the number of connection attempts made. If every sender of
    /// `stop` is dropped the loop can no longer be stopped and runs forever.
    pub async fn run<H: FrameHandler>(&self, handler: &mut H, mut stop: watch::Receiver<bool>) -> u64 {
        let mut attempts: u64 = 0;

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            attempts += 1;
            self.set_state(ConnectionState::Connecting);
            debug!(url = %self.config.url, attempt = attempts, "connecting");

            match self.session(handler, &mut stop).await {
                Ok(SessionEnd::Stopped) => break,
                Ok(SessionEnd::Closed) => info!(url = %self.config.url, "close"),
                Err(e) => warn!(
                    error = %e,
                    url = %self.config.url,
                    attempt = attempts,
                    "connection lost, will retry"
                ),
            }
            self.set_state(ConnectionState::Disconnected);

            let stopped = tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => false,
                _ = wait_for_stop(&mut stop) => true,
            };
            if stopped {
                break;
            }
        }

        self.set_state(ConnectionState::Disconnected);
        attempts
    }

    async fn session<H: FrameHandler>(
        &self,
        handler: &mut H,
        stop: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd> {
        let connected = tokio::select! {
            res = tokio_tungstenite::connect_async(self.config.url.as_str()) => Some(res),
            _ = wait_for_stop(stop) => None,
        };
        let Some(connected) = connected else {
            return Ok(SessionEnd::Stopped);
        };
        let (mut ws, _response) = connected?;

        self.set_state(ConnectionState::Connected);
        info!(url = %self.config.url, "open");
        handler.on_open();

        let end = loop {
            let event = tokio::select! {
                frame = ws.next() => SessionEvent::Frame(frame),
                _ = wait_for_stop(stop) => SessionEvent::Stop,
            };

            match event {
                SessionEvent::Frame(Some(Ok(WsMessage::Text(text)))) => {
                    if let Err(e) = handler.on_text(&text) {
                        error!(error = %e, bytes = text.len(), "failed to handle frame");
                    }
                }
                SessionEvent::Frame(Some(Ok(WsMessage::Close(frame)))) => {
                    debug!(?frame, "close frame received");
                }
                // Binary frames are not part of the protocol; pings are
                // answered by tungstenite.
                SessionEvent::Frame(Some(Ok(_))) => {}
                SessionEvent::Frame(Some(Err(e))) => {
                    handler.on_close();
                    return Err(e.into());
                }
                SessionEvent::Frame(None) => break SessionEnd::Closed,
                SessionEvent::Stop => {
                    let _ = ws.close(None).await;
                    break SessionEnd::Stopped;
                }
            }
        };

        handler.on_close();
        Ok(end)
    }
}

/// Resolve once `stop` holds `true`. Never resolves if the sender is gone.
async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
