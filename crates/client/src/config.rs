// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

/// Terminal chat client.
#[derive(Debug, Clone, Parser)]
#[command(name = "chatline", version, about)]
pub struct ClientConfig {
    /// Chat server origin (`http://` or `https://`). An `https` origin
    /// selects `wss` for the WebSocket connection.
    #[arg(long, default_value = "http://127.0.0.1:10000", env = "CHATLINE_SERVER")]
    pub server: String,

    /// WebSocket endpoint path.
    #[arg(long, default_value = "/ws", env = "CHATLINE_WS_PATH")]
    pub ws_path: String,

    /// Multipart upload endpoint path.
    #[arg(long, default_value = "/upload", env = "CHATLINE_UPLOAD_PATH")]
    pub upload_path: String,

    /// Connect timeout for upload requests in milliseconds.
    #[arg(long, default_value_t = 10000, env = "CHATLINE_CONNECT_TIMEOUT_MS")]
    pub connect_timeout_ms: u64,

    /// Log format (json or text).
    #[arg(long, env = "CHATLINE_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "CHATLINE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ClientConfig {
    /// Build a config pointing at `server` with every other field defaulted.
    pub fn for_server(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ws_path: "/ws".to_owned(),
            upload_path: "/upload".to_owned(),
            connect_timeout_ms: 10000,
            log_format: "text".to_owned(),
            log_level: "info".to_owned(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.server.starts_with("http://") && !self.server.starts_with("https://") {
            anyhow::bail!("--server must be an http:// or https:// origin, got {}", self.server);
        }
        if !self.ws_path.starts_with('/') {
            anyhow::bail!("--ws-path must start with '/', got {}", self.ws_path);
        }
        if !self.upload_path.starts_with('/') {
            anyhow::bail!("--upload-path must start with '/', got {}", self.upload_path);
        }
        if self.log_format != "json" && self.log_format != "text" {
            anyhow::bail!("--log-format must be json or text, got {}", self.log_format);
        }
        Ok(())
    }

    /// Whether the server origin was given over a secure scheme.
    pub fn is_secure(&self) -> bool {
        self.server.starts_with("https://")
    }

    /// WebSocket URL for the chat endpoint: `wss` iff the origin is secure.
    pub fn ws_url(&self) -> String {
        build_ws_url(&self.server, &self.ws_path)
    }

    /// HTTP URL of the upload endpoint.
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.server.trim_end_matches('/'), self.upload_path)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Convert an http(s) origin into the matching ws(s) endpoint URL.
pub fn build_ws_url(origin: &str, path: &str) -> String {
    let origin = origin.trim_end_matches('/');
    let ws_base = if origin.starts_with("https://") {
        origin.replacen("https://", "wss://", 1)
    } else {
        origin.replacen("http://", "ws://", 1)
    };
    format!("{ws_base}{path}")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
