// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test doubles shared by unit and integration tests.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::connection::ConnectionState;
use crate::render::{RenderKind, RenderPayload, Renderer};

/// Renderer that records every call for later inspection.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    entries: Mutex<Vec<(RenderKind, RenderPayload)>>,
    states: Mutex<Vec<ConnectionState>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(RenderKind, RenderPayload)> {
        self.entries.lock().clone()
    }

    pub fn kinds(&self) -> Vec<RenderKind> {
        self.entries.lock().iter().map(|(kind, _)| *kind).collect()
    }

    pub fn states(&self) -> Vec<ConnectionState> {
        self.states.lock().clone()
    }

    /// Poll until at least `count` entries were rendered or `timeout` elapses.
    pub async fn wait_for_entries(
        &self,
        count: usize,
        timeout: Duration,
    ) -> anyhow::Result<Vec<(RenderKind, RenderPayload)>> {
        let deadline = Instant::now() + timeout;
        loop {
            let entries = self.entries();
            if entries.len() >= count {
                return Ok(entries);
            }
            if Instant::now() >= deadline {
                anyhow::bail!("timed out waiting for {count} entries, got {entries:?}");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Poll until `state` was reported or `timeout` elapses.
    pub async fn wait_for_state(
        &self,
        state: ConnectionState,
        timeout: Duration,
    ) -> anyhow::Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.states.lock().contains(&state) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                anyhow::bail!("timed out waiting for state {state}, got {:?}", self.states());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, kind: RenderKind, payload: RenderPayload) {
        self.entries.lock().push((kind, payload));
    }

    fn connection_changed(&self, state: ConnectionState) {
        self.states.lock().push(state);
    }
}
