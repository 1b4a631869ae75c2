// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One chat session: identity, connection, dispatch loop, and uploads wired
//! together, plus interpretation of the user's input lines.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::dispatch::{run_dispatch_loop, MessageDispatcher};
use crate::identity::IdentityState;
use crate::render::{RenderKind, RenderPayload, Renderer, ALARM_COLOR};
use crate::upload::{UploadClient, UploadCoordinator, UploadHandle};

/// Local command that uploads files instead of sending text.
pub const UPLOAD_COMMAND: &str = "/upload";

/// What happened to one line of user input.
pub enum Submitted {
    /// Written to the connection.
    Sent,
    /// Not sent: empty, or the connection is not open.
    Dropped,
    /// Handled locally as an upload batch; one handle per accepted file.
    Uploads(Vec<UploadHandle>),
}

pub struct Session {
    identity: IdentityState,
    connection: ConnectionManager,
    uploads: UploadCoordinator,
    renderer: Arc<dyn Renderer>,
    dispatch_task: JoinHandle<()>,
}

impl Session {
    /// Start connecting and spawn the dispatch loop.
    pub fn start(
        config: &ClientConfig,
        renderer: Arc<dyn Renderer>,
        shutdown: &CancellationToken,
    ) -> Self {
        let identity = IdentityState::new();
        let (connection, events) = ConnectionManager::connect(config.ws_url(), shutdown);

        let dispatcher = MessageDispatcher::new(identity.clone(), Arc::clone(&renderer));
        let dispatch_task = tokio::spawn(run_dispatch_loop(events, dispatcher));

        let client = UploadClient::new(config.upload_url(), config.connect_timeout());
        let uploads = UploadCoordinator::new(client, Arc::clone(&renderer));

        Self { identity, connection, uploads, renderer, dispatch_task }
    }

    pub fn identity(&self) -> &IdentityState {
        &self.identity
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }

    /// Handle one line typed by the user.
    ///
    /// `/upload <path>...` reads the files and submits them as one batch.
    /// Submitted transfers run on their own tasks and outlive this call.
    /// Anything else is chat text for the server, sent only while open.
    pub async fn submit_line(&self, line: &str) -> Submitted {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(args) = upload_args(line) {
            return Submitted::Uploads(self.upload_paths(args).await);
        }

        if line.trim().is_empty() {
            return Submitted::Dropped;
        }
        if !self.connection.is_open() {
            debug!(state = %self.state(), "not connected, input dropped");
            return Submitted::Dropped;
        }
        self.connection.send(line);
        Submitted::Sent
    }

    async fn upload_paths(&self, args: &str) -> Vec<UploadHandle> {
        let paths: Vec<&Path> = args.split_whitespace().map(Path::new).collect();
        if paths.is_empty() {
            self.notify_error(format!("usage: {UPLOAD_COMMAND} <path>..."));
            return Vec::new();
        }
        self.uploads.submit_paths(&paths).await
    }

    fn notify_error(&self, text: String) {
        self.renderer.render(RenderKind::Error, RenderPayload::system(text, ALARM_COLOR));
    }

    /// Wait for every submitted upload to finish, successfully or not.
    pub async fn drain_uploads(&self) {
        let outstanding = self.uploads.progress().outstanding();
        if outstanding > 0 {
            info!(outstanding, "waiting for uploads to finish");
        }
        self.uploads.progress().wait_idle().await;
    }

    /// Close the connection and wait for the dispatch loop to drain.
    /// Uploads still in flight are not waited for; see [`Session::drain_uploads`].
    pub async fn shutdown(self) {
        self.connection.close();
        let Self { connection, dispatch_task, .. } = self;
        // The loop ends once the transport task drops its event sender.
        let _ = dispatch_task.await;
        drop(connection);
    }
}

/// Arguments of an `/upload` command line, if it is one.
fn upload_args(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix(UPLOAD_COMMAND)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        return Some(rest);
    }
    None
}
