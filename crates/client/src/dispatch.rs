// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classifies inbound envelopes and forwards them to the renderer.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::connection::ConnectionEvent;
use crate::identity::IdentityState;
use crate::protocol::{self, Envelope};
use crate::render::{
    RenderKind, RenderPayload, Renderer, UploadDescriptor, ALARM_COLOR, HELP_COLOR, SYSTEM_COLOR,
};

/// Hint shown right after the welcome line.
pub const HELP_HINT: &str = "type /help to see the available commands";

/// Body line rendered above the command list of a `help` envelope.
pub const HELP_TITLE: &str = "available commands";

/// Turns each raw payload into zero or more render calls.
///
/// Every recognized envelope produces exactly one call, except `assign`
/// (two locally synthesized system lines) and unknown kinds (none).
pub struct MessageDispatcher {
    identity: IdentityState,
    renderer: Arc<dyn Renderer>,
}

impl MessageDispatcher {
    pub fn new(identity: IdentityState, renderer: Arc<dyn Renderer>) -> Self {
        Self { identity, renderer }
    }

    /// Decode and handle one raw text payload. Malformed payloads are logged
    /// and discarded.
    pub fn dispatch(&self, payload: &str) {
        match protocol::decode(payload) {
            Ok(envelope) => self.handle(envelope),
            Err(e) => {
                warn!(code = e.as_str(), err = %e, "discarding inbound payload");
            }
        }
    }

    /// Handle an already-decoded envelope.
    pub fn handle(&self, envelope: Envelope) {
        debug!(kind = envelope.kind(), "dispatching envelope");
        match envelope {
            Envelope::Assign { id, color } => {
                self.identity.assign(id.clone(), color);
                self.emit(
                    RenderKind::System,
                    RenderPayload::system(format!("welcome! your id is {id}"), SYSTEM_COLOR),
                );
                self.emit(RenderKind::System, RenderPayload::system(HELP_HINT, SYSTEM_COLOR));
            }
            Envelope::Msg { from, text, color, .. } => {
                self.emit(RenderKind::Plain, RenderPayload::line(from, text, color));
            }
            Envelope::Upload { from, color, url, filename, .. } => {
                let upload = UploadDescriptor {
                    from,
                    color: color.unwrap_or_else(|| SYSTEM_COLOR.to_owned()),
                    url,
                    filename,
                    size: 0,
                };
                self.emit(RenderKind::Upload, RenderPayload::Upload(upload));
            }
            Envelope::System { text } => {
                self.emit(RenderKind::System, RenderPayload::system(text, SYSTEM_COLOR));
            }
            Envelope::Help { commands } => {
                let payload = RenderPayload::Help {
                    text: HELP_TITLE.to_owned(),
                    commands,
                    color: HELP_COLOR.to_owned(),
                };
                self.emit(RenderKind::Help, payload);
            }
            Envelope::Whisper { from, text, color, .. } => {
                self.emit(RenderKind::Whisper, RenderPayload::line(from, text, color));
            }
            Envelope::Blocked { from } => {
                let text = format!("a message from {from} was blocked");
                self.emit(RenderKind::BlockedNotice, RenderPayload::line(from, text, ALARM_COLOR));
            }
            Envelope::Warn { text } => {
                let text = format!("warning: {text}");
                self.emit(RenderKind::Error, RenderPayload::system(text, ALARM_COLOR));
            }
            Envelope::Banned { reason } => {
                let text = format!("banned: {reason}");
                self.emit(RenderKind::Error, RenderPayload::system(text, ALARM_COLOR));
            }
            Envelope::Unknown => {
                debug!("ignoring envelope of unknown type");
            }
        }
    }

    fn emit(&self, kind: RenderKind, payload: RenderPayload) {
        self.renderer.render(kind, payload);
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }
}

/// Consume connection events until the connection task goes away.
///
/// This loop is the only writer of the session identity.
pub async fn run_dispatch_loop(
    mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
    dispatcher: MessageDispatcher,
) {
    while let Some(event) = events.recv().await {
        match event {
            ConnectionEvent::Message(payload) => dispatcher.dispatch(&payload),
            ConnectionEvent::State(state) => dispatcher.renderer().connection_changed(state),
        }
    }
    debug!("dispatch loop finished");
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
