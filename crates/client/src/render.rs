// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering contract between the client core and its presentation layer.
//!
//! The core classifies events into a [`RenderKind`] plus the fields that kind
//! needs; it never formats, lays out, or scrolls anything itself.

use crate::connection::ConnectionState;

/// Accent for `system` lines and the locally synthesized welcome lines.
pub const SYSTEM_COLOR: &str = "#4caf50";
/// Accent for `help` blocks.
pub const HELP_COLOR: &str = "#2196f3";
/// Alarm color for blocked notices, upload failures, warnings and bans.
pub const ALARM_COLOR: &str = "#f44336";

/// Actor name used for lines the server or client emits on its own behalf.
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderKind {
    System,
    Help,
    Upload,
    Whisper,
    Plain,
    BlockedNotice,
    Error,
}

impl RenderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Help => "help",
            Self::Upload => "upload",
            Self::Whisper => "whisper",
            Self::Plain => "plain",
            Self::BlockedNotice => "blocked-notice",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for RenderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file announced by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDescriptor {
    pub from: String,
    pub color: String,
    pub url: String,
    pub filename: String,
    /// Byte size; `0` means unknown (the server does not transmit it).
    pub size: u64,
}

/// Fields handed to the renderer alongside a [`RenderKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPayload {
    /// One timeline line attributed to `from`.
    Line { from: String, text: String, color: String },
    /// A body line followed by an ordered list of commands.
    Help { text: String, commands: Vec<String>, color: String },
    Upload(UploadDescriptor),
}

impl RenderPayload {
    pub fn line(
        from: impl Into<String>,
        text: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self::Line { from: from.into(), text: text.into(), color: color.into() }
    }

    /// Line attributed to the system actor.
    pub fn system(text: impl Into<String>, color: &str) -> Self {
        Self::line(SYSTEM_ACTOR, text, color)
    }

    pub fn color(&self) -> &str {
        match self {
            Self::Line { color, .. } | Self::Help { color, .. } => color,
            Self::Upload(upload) => &upload.color,
        }
    }
}

/// Presentation collaborator. Implementations must be cheap and non-blocking:
/// calls come from the dispatch loop and from upload tasks.
pub trait Renderer: Send + Sync {
    fn render(&self, kind: RenderKind, payload: RenderPayload);

    /// Called once per connection state transition.
    fn connection_changed(&self, _state: ConnectionState) {}
}
