// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chatline: real-time chat client core.
//!
//! One WebSocket connection carries typed JSON envelopes from the server;
//! files go out-of-band over HTTP and come back as `upload` envelopes.

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod render;
pub mod session;
pub mod terminal;
pub mod test_support;
pub mod tls;
pub mod upload;
