// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Why an inbound payload could not be turned into an envelope.
///
/// Always recoverable: the dispatcher logs and discards the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload is not JSON at all.
    NotJson(String),
    /// JSON object without a string `type` discriminant.
    MissingType,
    /// Known `type` but the fields do not match its shape.
    InvalidFields { kind: String, message: String },
}

impl DecodeError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotJson(_) => "NOT_JSON",
            Self::MissingType => "MISSING_TYPE",
            Self::InvalidFields { .. } => "INVALID_FIELDS",
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson(msg) => write!(f, "payload is not JSON: {msg}"),
            Self::MissingType => f.write_str("envelope has no type"),
            Self::InvalidFields { kind, message } => {
                write!(f, "invalid {kind} envelope: {message}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Failure of a single file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Rejected client-side by the size policy; no request was made.
    TooLarge { size: u64, limit: u64 },
    /// The upload endpoint answered with a non-success status.
    Rejected { status: u16 },
    /// The request never produced a response (connect, DNS, reset, ...).
    Transport(String),
    /// The selected file could not be read from disk.
    Read(String),
}

impl UploadError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooLarge { .. } => "TOO_LARGE",
            Self::Rejected { .. } => "REJECTED",
            Self::Transport(_) => "TRANSPORT",
            Self::Read(_) => "READ",
        }
    }

    /// Timeline text for this failure, naming the affected file.
    pub fn notice(&self, filename: &str) -> String {
        match self {
            Self::TooLarge { .. } => format!("file too large: {filename}"),
            Self::Rejected { status } => {
                format!("upload rejected by server: {filename} (status {status})")
            }
            Self::Transport(_) => format!("upload failed: transport error: {filename}"),
            Self::Read(msg) => format!("cannot read file: {filename} ({msg})"),
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { size, limit } => {
                write!(f, "file too large ({size} bytes, limit {limit})")
            }
            Self::Rejected { status } => write!(f, "rejected by server with status {status}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Read(msg) => write!(f, "read error: {msg}"),
        }
    }
}

impl std::error::Error for UploadError {}
