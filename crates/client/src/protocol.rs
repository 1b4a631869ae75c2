// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound wire protocol: JSON envelopes discriminated by `type`.
//!
//! Outbound traffic is plain text (the user's line, verbatim), so only the
//! server-to-client direction is modelled here.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// One decoded server frame.
///
/// Unrecognized `type` values decode to [`Envelope::Unknown`] so newer
/// servers can add kinds without breaking older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    /// Identity grant, sent once per connection.
    Assign { id: String, color: String },
    /// Ordinary broadcast chat line.
    Msg {
        from: String,
        text: String,
        color: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
    },
    /// A file finished uploading and is available at `url`. Size is never sent.
    Upload {
        from: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        url: String,
        filename: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
    },
    /// Server informational line.
    System { text: String },
    /// Command reference, one description per entry.
    Help {
        #[serde(default)]
        commands: Vec<String>,
    },
    /// Private message.
    Whisper {
        from: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
        text: String,
        color: String,
    },
    /// A message from `from` was suppressed by the server's block list.
    Blocked { from: String },
    /// Rate-limit warning for this client.
    Warn { text: String },
    /// This client is temporarily banned.
    Banned { reason: String },
    #[serde(other)]
    Unknown,
}

impl Envelope {
    /// Wire name of this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Assign { .. } => "assign",
            Self::Msg { .. } => "msg",
            Self::Upload { .. } => "upload",
            Self::System { .. } => "system",
            Self::Help { .. } => "help",
            Self::Whisper { .. } => "whisper",
            Self::Blocked { .. } => "blocked",
            Self::Warn { .. } => "warn",
            Self::Banned { .. } => "banned",
            Self::Unknown => "unknown",
        }
    }
}

/// Decode one text frame into an envelope.
pub fn decode(payload: &str) -> Result<Envelope, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| DecodeError::NotJson(e.to_string()))?;

    let kind = match value.get("type").and_then(|t| t.as_str()) {
        Some(kind) => kind.to_owned(),
        None => return Err(DecodeError::MissingType),
    };

    serde_json::from_value(value)
        .map_err(|e| DecodeError::InvalidFields { kind, message: e.to_string() })
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
