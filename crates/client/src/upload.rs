// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File upload: size policy, concurrent multipart transfers, and the shared
//! "upload in progress" indicator.
//!
//! A successful transfer renders nothing locally. The server announces the
//! file to everyone (this client included) with an `upload` envelope.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::render::{RenderKind, RenderPayload, Renderer, ALARM_COLOR};

/// Largest file accepted for upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Multipart field carrying the file body.
const FILE_FIELD: &str = "file";

/// A user-selected file. The size is always the length of the content.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    name: String,
    content: Bytes,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self { name: name.into(), content: content.into() }
    }

    /// Read a file from disk, applying the size policy before and during the
    /// read so an oversized file is never held in memory.
    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let read_error = |e: std::io::Error| UploadError::Read(e.to_string());

        let len = tokio::fs::metadata(path).await.map_err(read_error)?.len();
        if len > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge { size: len, limit: MAX_UPLOAD_BYTES });
        }

        // Device files report zero length and may never end.
        let file = tokio::fs::File::open(path).await.map_err(read_error)?;
        let mut content = Vec::new();
        file.take(MAX_UPLOAD_BYTES + 1).read_to_end(&mut content).await.map_err(read_error)?;

        let candidate = Self::new(display_name(path), content);
        candidate.check_size()?;
        Ok(candidate)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Apply the size policy.
    pub fn check_size(&self) -> Result<(), UploadError> {
        let size = self.size();
        if size > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge { size, limit: MAX_UPLOAD_BYTES });
        }
        Ok(())
    }
}

/// Name shown for a file selected by path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Pending,
    Uploading,
    Succeeded,
    Failed,
}

/// HTTP client for the upload endpoint.
pub struct UploadClient {
    url: String,
    client: Client,
}

impl UploadClient {
    pub fn new(url: String, connect_timeout: Duration) -> Self {
        crate::tls::ensure_crypto();
        let client = Client::builder().connect_timeout(connect_timeout).build().unwrap_or_default();
        Self { url, client }
    }

    /// POST one file as a single-field multipart body. Only the status is
    /// consumed.
    pub async fn upload(&self, file: &UploadCandidate) -> Result<(), UploadError> {
        let part = Part::stream_with_length(file.content.clone(), file.size())
            .file_name(file.name.clone());
        let form = Form::new().part(FILE_FIELD, part);

        let resp = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UploadError::Rejected { status: status.as_u16() });
        }
        Ok(())
    }
}

/// Count of outstanding transfers; the indicator is visible iff it is > 0.
#[derive(Clone)]
pub struct UploadProgress {
    inner: Arc<ProgressInner>,
}

struct ProgressInner {
    outstanding: AtomicUsize,
    visible: watch::Sender<bool>,
}

impl UploadProgress {
    fn new() -> Self {
        let (visible, _) = watch::channel(false);
        Self { inner: Arc::new(ProgressInner { outstanding: AtomicUsize::new(0), visible }) }
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::SeqCst)
    }

    pub fn is_visible(&self) -> bool {
        *self.inner.visible.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.visible.subscribe()
    }

    /// Resolve once no transfer is outstanding.
    pub async fn wait_idle(&self) {
        let mut visible = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = visible.wait_for(|shown| !*shown).await;
    }

    fn begin(&self) -> ProgressGuard {
        self.inner.outstanding.fetch_add(1, Ordering::SeqCst);
        self.refresh();
        ProgressGuard { progress: self.clone() }
    }

    // Recompute under the watch lock so the last writer sees the final count.
    fn refresh(&self) {
        let outstanding = &self.inner.outstanding;
        self.inner.visible.send_if_modified(|visible| {
            let next = outstanding.load(Ordering::SeqCst) > 0;
            if *visible == next {
                return false;
            }
            *visible = next;
            true
        });
    }
}

/// Releases one outstanding transfer when dropped, even if the task panics.
struct ProgressGuard {
    progress: UploadProgress,
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.progress.inner.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.progress.refresh();
    }
}

/// One accepted file moving through its transfer.
struct UploadTask {
    file: UploadCandidate,
    state: watch::Sender<UploadState>,
}

impl UploadTask {
    async fn run(self, client: &UploadClient, renderer: &dyn Renderer) -> UploadState {
        self.state.send_replace(UploadState::Uploading);
        debug!(file = %self.file.name, size = self.file.size(), "upload started");

        let outcome = match client.upload(&self.file).await {
            Ok(()) => {
                info!(file = %self.file.name, size = self.file.size(), "upload accepted");
                UploadState::Succeeded
            }
            Err(e) => {
                warn!(file = %self.file.name, code = e.as_str(), err = %e, "upload failed");
                let notice = RenderPayload::system(e.notice(&self.file.name), ALARM_COLOR);
                renderer.render(RenderKind::Error, notice);
                UploadState::Failed
            }
        };
        self.state.send_replace(outcome);
        outcome
    }
}

/// Result slot for one spawned transfer.
pub struct UploadHandle {
    pub filename: String,
    state: watch::Receiver<UploadState>,
    task: JoinHandle<UploadState>,
}

impl UploadHandle {
    /// Where the transfer currently is.
    pub fn state(&self) -> UploadState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.clone()
    }

    /// Wait for the transfer to finish. A task that died counts as failed.
    pub async fn outcome(self) -> UploadState {
        self.task.await.unwrap_or(UploadState::Failed)
    }
}

/// Validates and launches uploads. Every accepted file runs as its own task;
/// a batch never waits on itself.
pub struct UploadCoordinator {
    client: Arc<UploadClient>,
    renderer: Arc<dyn Renderer>,
    progress: UploadProgress,
}

impl UploadCoordinator {
    pub fn new(client: UploadClient, renderer: Arc<dyn Renderer>) -> Self {
        Self { client: Arc::new(client), renderer, progress: UploadProgress::new() }
    }

    pub fn progress(&self) -> &UploadProgress {
        &self.progress
    }

    /// Submit a batch from one user action. Oversized files are rejected with
    /// an error notice before any request; the rest start immediately.
    ///
    /// Returns one handle per accepted file, in batch order.
    pub fn submit_batch(&self, files: Vec<UploadCandidate>) -> Vec<UploadHandle> {
        let mut handles = Vec::with_capacity(files.len());
        for file in files {
            if let Err(e) = file.check_size() {
                self.reject(&file.name, &e);
                continue;
            }
            handles.push(self.spawn_transfer(file));
        }
        handles
    }

    /// Read files from disk and submit them as one batch. Files that are too
    /// large or unreadable get an error notice and are skipped.
    pub async fn submit_paths(&self, paths: &[&Path]) -> Vec<UploadHandle> {
        let mut batch = Vec::with_capacity(paths.len());
        for path in paths {
            match UploadCandidate::from_path(path).await {
                Ok(file) => batch.push(file),
                Err(e) => self.reject(&display_name(path), &e),
            }
        }
        self.submit_batch(batch)
    }

    fn reject(&self, filename: &str, err: &UploadError) {
        warn!(file = %filename, code = err.as_str(), err = %err, "upload rejected");
        let notice = RenderPayload::system(err.notice(filename), ALARM_COLOR);
        self.renderer.render(RenderKind::Error, notice);
    }

    fn spawn_transfer(&self, file: UploadCandidate) -> UploadHandle {
        let guard = self.progress.begin();
        let client = Arc::clone(&self.client);
        let renderer = Arc::clone(&self.renderer);
        let filename = file.name.clone();
        let (state_tx, state_rx) = watch::channel(UploadState::Pending);

        let task = tokio::spawn(async move {
            let _guard = guard;
            UploadTask { file, state: state_tx }.run(&client, renderer.as_ref()).await
        });

        UploadHandle { filename, state: state_rx, task }
    }
}

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;
