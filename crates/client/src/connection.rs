// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The client's single WebSocket connection to the chat server.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Externally observable connection lifecycle.
///
/// `Closed` covers both a graceful close and any transport error. There is
/// no way back from `Closed`: reconnect policy belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification emitted by the connection task, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The lifecycle moved to a new state.
    State(ConnectionState),
    /// Raw text payload of one inbound frame.
    Message(String),
}

/// Owns the transport task for one WebSocket connection.
///
/// Connecting starts on construction. Dropping the manager closes the
/// connection.
pub struct ConnectionManager {
    state_rx: watch::Receiver<ConnectionState>,
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl ConnectionManager {
    /// Start connecting to `url` and return the manager plus the event stream.
    ///
    /// The connection is torn down when `shutdown` (or the manager) goes away.
    pub fn connect(
        url: impl Into<String>,
        shutdown: &CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let url = url.into();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = shutdown.child_token();

        let lifecycle = Lifecycle { state_tx, event_tx };
        tokio::spawn(run_transport(url, lifecycle, outbound_rx, cancel.clone()));

        (Self { state_rx, outbound: outbound_tx, cancel }, event_rx)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Receiver that observes every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Write `text` verbatim as one text frame.
    ///
    /// Silently dropped unless the connection is open, and never sent when
    /// empty or whitespace-only.
    pub fn send(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let state = self.state();
        if state != ConnectionState::Open {
            debug!(%state, "dropping outbound message, connection not open");
            return;
        }
        if self.outbound.send(text.to_owned()).is_err() {
            debug!("dropping outbound message, transport task gone");
        }
    }

    /// Close the connection. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Single writer of the connection state.
struct Lifecycle {
    state_tx: watch::Sender<ConnectionState>,
    event_tx: mpsc::UnboundedSender<ConnectionEvent>,
}

impl Lifecycle {
    /// Move to `next`, emitting an event only if the state actually changed.
    fn transition(&self, next: ConnectionState) -> bool {
        let changed = self.state_tx.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            debug!(state = %next, "connection state changed");
            // Ignore send errors (nobody listening).
            let _ = self.event_tx.send(ConnectionEvent::State(next));
        }
        changed
    }

    fn message(&self, text: String) {
        let _ = self.event_tx.send(ConnectionEvent::Message(text));
    }
}

async fn run_transport(
    url: String,
    lifecycle: Lifecycle,
    mut outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let connected = tokio::select! {
        _ = cancel.cancelled() => {
            lifecycle.transition(ConnectionState::Closed);
            return;
        }
        result = tokio_tungstenite::connect_async(&url) => result,
    };

    let ws_stream = match connected {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            warn!(%url, err = %e, "websocket connect failed");
            lifecycle.transition(ConnectionState::Closed);
            return;
        }
    };

    info!(%url, "websocket connected");
    lifecycle.transition(ConnectionState::Open);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            text = outbound.recv() => {
                let Some(text) = text else {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    debug!(err = %e, "websocket write failed");
                    break;
                }
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => lifecycle.message(text.to_string()),
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("websocket closed by server");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(err = %e, "websocket read failed");
                        break;
                    }
                    _ => {} // ping/pong/binary ignored
                }
            }
        }
    }

    info!(%url, "websocket disconnected");
    lifecycle.transition(ConnectionState::Closed);
}
