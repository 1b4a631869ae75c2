// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented terminal front end: stdin in, plain-text timeline out.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::connection::ConnectionState;
use crate::render::{RenderKind, RenderPayload, Renderer};
use crate::session::{Session, Submitted};

/// Why the input loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    EndOfInput,
    Disconnected,
    Interrupted,
}

/// Run the terminal client until stdin closes, ctrl-c, or the server hangs up.
///
/// Uploads still in flight are allowed to finish unless the user interrupted.
pub async fn run(config: ClientConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let renderer = Arc::new(TerminalRenderer::new());

    info!(server = %config.server, ws = %config.ws_url(), "starting chat session");
    let session = Session::start(&config, renderer, &shutdown);

    spawn_progress_printer(&session, shutdown.clone());

    let mut state_rx = session.connection().subscribe_state();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let exit = loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break Exit::EndOfInput;
                };
                if let Submitted::Dropped = session.submit_line(&line).await {
                    if session.state() != ConnectionState::Open && !line.trim().is_empty() {
                        warn!("not connected, message not sent");
                    }
                }
            }
            closed = state_rx.wait_for(|s| *s == ConnectionState::Closed) => {
                if closed.is_ok() {
                    info!("connection closed, exiting");
                }
                break Exit::Disconnected;
            }
            ctrl_c = tokio::signal::ctrl_c() => {
                if let Err(e) = ctrl_c {
                    warn!(err = %e, "ctrl-c handler failed");
                }
                break Exit::Interrupted;
            }
        }
    };

    if exit != Exit::Interrupted {
        tokio::select! {
            _ = session.drain_uploads() => {}
            _ = tokio::signal::ctrl_c() => warn!("interrupted, abandoning uploads"),
        }
    }

    shutdown.cancel();
    session.shutdown().await;
    Ok(())
}

/// Print the shared "upload in progress" indicator whenever it flips.
fn spawn_progress_printer(session: &Session, shutdown: CancellationToken) {
    let mut visible = session.uploads().progress().subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = visible.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let shown = *visible.borrow_and_update();
                    print_progress(shown);
                }
            }
        }
    });
}

fn print_progress(visible: bool) {
    let text = if visible { "uploading..." } else { "uploads finished" };
    let _ = writeln!(std::io::stdout().lock(), "*** {text}");
}

/// Writes the timeline to stdout as plain text lines.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, kind: RenderKind, payload: RenderPayload) {
        let mut out = std::io::stdout().lock();
        for line in format_entry(kind, &payload) {
            let _ = writeln!(out, "{line}");
        }
        let _ = out.flush();
    }

    fn connection_changed(&self, state: ConnectionState) {
        let text = match state {
            ConnectionState::Connecting => "connecting...",
            ConnectionState::Open => "connected",
            ConnectionState::Closed => "disconnected",
        };
        let _ = writeln!(std::io::stdout().lock(), "*** {text}");
    }
}

/// Plain-text lines for one timeline entry.
pub fn format_entry(kind: RenderKind, payload: &RenderPayload) -> Vec<String> {
    match payload {
        RenderPayload::Line { from, text, .. } => {
            let line = match kind {
                RenderKind::System => format!("*** {text}"),
                RenderKind::Whisper => format!("(whisper) <{from}> {text}"),
                RenderKind::BlockedNotice | RenderKind::Error => format!("!!! {text}"),
                _ => format!("<{from}> {text}"),
            };
            vec![line]
        }
        RenderPayload::Help { text, commands, .. } => {
            let mut lines = Vec::with_capacity(commands.len() + 1);
            lines.push(format!("*** {text}"));
            lines.extend(commands.iter().enumerate().map(|(i, cmd)| format!("  {}. {cmd}", i + 1)));
            lines
        }
        RenderPayload::Upload(upload) => {
            let size = if upload.size == 0 {
                "size unknown".to_owned()
            } else {
                format!("{} bytes", upload.size)
            };
            vec![format!("<{}> [file] {} ({size}) {}", upload.from, upload.filename, upload.url)]
        }
    }
}
