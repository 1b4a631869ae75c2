// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identity granted by the server's `assign` envelope.

use std::sync::Arc;

use parking_lot::RwLock;

/// Color used for the local user before the server assigns one.
pub const UNASSIGNED_COLOR: &str = "#888888";

/// Snapshot of the session's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Option<String>,
    pub color: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self { id: None, color: UNASSIGNED_COLOR.to_owned() }
    }
}

/// Shared handle to the session identity.
///
/// Written only by the dispatch loop; read by anything holding a clone.
/// A second `assign` overwrites the first without complaint.
#[derive(Debug, Clone, Default)]
pub struct IdentityState {
    inner: Arc<RwLock<Identity>>,
}

impl IdentityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&self, id: impl Into<String>, color: impl Into<String>) {
        let mut identity = self.inner.write();
        identity.id = Some(id.into());
        identity.color = color.into();
    }

    pub fn snapshot(&self) -> Identity {
        self.inner.read().clone()
    }

    pub fn id(&self) -> Option<String> {
        self.inner.read().id.clone()
    }

    pub fn color(&self) -> String {
        self.inner.read().color.clone()
    }

    pub fn is_assigned(&self) -> bool {
        self.inner.read().id.is_some()
    }
}
