// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::*;
use crate::test_support::RecordingRenderer;

/// Upload endpoint nobody listens on.
const DEAD_URL: &str = "http://127.0.0.1:9/upload";

fn zeros(name: &str, size: u64) -> UploadCandidate {
    UploadCandidate::new(name, vec![0u8; size as usize])
}

fn coordinator(url: &str) -> (UploadCoordinator, Arc<RecordingRenderer>) {
    let renderer = Arc::new(RecordingRenderer::new());
    let client = UploadClient::new(url.to_owned(), Duration::from_secs(2));
    (UploadCoordinator::new(client, renderer.clone()), renderer)
}

// -- Size policy ---------------------------------------------------------------

#[test]
fn size_limit_is_inclusive() {
    assert!(zeros("exact.bin", MAX_UPLOAD_BYTES).check_size().is_ok());
    assert_eq!(
        zeros("big.bin", MAX_UPLOAD_BYTES + 1).check_size(),
        Err(UploadError::TooLarge { size: MAX_UPLOAD_BYTES + 1, limit: MAX_UPLOAD_BYTES })
    );
}

#[test]
fn candidate_size_follows_content() {
    let file = UploadCandidate::new("a.txt", b"hello".to_vec());
    assert_eq!(file.size(), 5);
    assert_eq!(file.name(), "a.txt");
}

#[tokio::test]
async fn oversized_file_is_rejected_before_transfer() -> anyhow::Result<()> {
    let (coordinator, renderer) = coordinator(DEAD_URL);
    let handles = coordinator.submit_batch(vec![zeros("huge.iso", MAX_UPLOAD_BYTES + 1)]);

    assert!(handles.is_empty());
    assert_eq!(coordinator.progress().outstanding(), 0);
    assert!(!coordinator.progress().is_visible());

    let entries = renderer.entries();
    assert_eq!(entries.len(), 1);
    let (RenderKind::Error, RenderPayload::Line { text, color, .. }) = &entries[0] else {
        anyhow::bail!("expected error notice, got {:?}", entries[0]);
    };
    assert!(text.contains("file too large"), "{text}");
    assert!(text.contains("huge.iso"), "{text}");
    assert_eq!(color, ALARM_COLOR);
    Ok(())
}

// -- Transfer failures ---------------------------------------------------------

#[tokio::test]
async fn transport_failure_reports_alarm_notice() -> anyhow::Result<()> {
    let (coordinator, renderer) = coordinator(DEAD_URL);
    let mut handles = coordinator.submit_batch(vec![UploadCandidate::new("a.txt", "abc")]);
    assert_eq!(handles.len(), 1);

    let Some(handle) = handles.pop() else {
        anyhow::bail!("no handle");
    };
    assert_eq!(handle.filename, "a.txt");
    assert_eq!(handle.outcome().await, UploadState::Failed);

    let entries = renderer.entries();
    assert_eq!(entries.len(), 1);
    let (RenderKind::Error, RenderPayload::Line { text, color, .. }) = &entries[0] else {
        anyhow::bail!("expected error notice, got {:?}", entries[0]);
    };
    assert!(text.contains("transport error"), "{text}");
    assert_eq!(color, ALARM_COLOR);
    Ok(())
}

#[test]
fn rejected_and_transport_notices_differ() {
    let rejected = UploadError::Rejected { status: 500 }.notice("a.txt");
    let transport = UploadError::Transport("reset".into()).notice("a.txt");
    assert!(rejected.contains("rejected by server"));
    assert!(transport.contains("transport error"));
    assert_ne!(rejected, transport);
}

// -- Progress indicator --------------------------------------------------------

#[test]
fn progress_visible_while_any_transfer_outstanding() {
    let progress = UploadProgress::new();
    let rx = progress.subscribe();
    assert!(!progress.is_visible());

    let first = progress.begin();
    let second = progress.begin();
    assert_eq!(progress.outstanding(), 2);
    assert!(*rx.borrow());

    drop(first);
    assert!(progress.is_visible(), "one transfer still outstanding");

    drop(second);
    assert_eq!(progress.outstanding(), 0);
    assert!(!*rx.borrow());
}

#[tokio::test]
async fn progress_clears_after_failed_batch() {
    let (coordinator, _renderer) = coordinator(DEAD_URL);
    let handles = coordinator.submit_batch(vec![
        UploadCandidate::new("a.txt", "a"),
        UploadCandidate::new("b.txt", "b"),
    ]);
    assert_eq!(handles.len(), 2);

    for handle in handles {
        assert_eq!(handle.outcome().await, UploadState::Failed);
    }
    assert_eq!(coordinator.progress().outstanding(), 0);
    assert!(!coordinator.progress().is_visible());
}

// -- Reading from disk ---------------------------------------------------------

#[tokio::test]
async fn from_path_reads_name_and_content() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile()?;
    file.write_all(b"file body")?;

    let candidate = UploadCandidate::from_path(file.path()).await?;
    assert_eq!(candidate.size(), 9);
    assert_eq!(candidate.content(), &Bytes::from_static(b"file body"));
    assert!(candidate.name().ends_with(".txt"));
    Ok(())
}

#[tokio::test]
async fn from_path_missing_file_is_a_read_error() {
    let result = UploadCandidate::from_path(Path::new("/definitely/not/here.bin")).await;
    assert!(matches!(result, Err(UploadError::Read(_))), "{result:?}");
}

#[tokio::test]
async fn oversized_file_is_rejected_from_its_length() -> anyhow::Result<()> {
    // Sparse: the length is set without writing any data.
    let file = tempfile::Builder::new().suffix(".iso").tempfile()?;
    let len = 64 * 1024 * 1024;
    file.as_file().set_len(len)?;

    // The reported size comes from the file's metadata, not from a capped read.
    let result = UploadCandidate::from_path(file.path()).await;
    assert_eq!(result.err(), Some(UploadError::TooLarge { size: len, limit: MAX_UPLOAD_BYTES }));
    Ok(())
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn endless_device_read_stops_past_the_limit() {
    let result = UploadCandidate::from_path(Path::new("/dev/zero")).await;
    assert_eq!(
        result.err(),
        Some(UploadError::TooLarge { size: MAX_UPLOAD_BYTES + 1, limit: MAX_UPLOAD_BYTES })
    );
}

#[tokio::test]
async fn submit_paths_reports_unusable_files_and_sends_the_rest() -> anyhow::Result<()> {
    let oversized = tempfile::Builder::new().prefix("big").tempfile()?;
    oversized.as_file().set_len(MAX_UPLOAD_BYTES + 1)?;
    let mut small = tempfile::Builder::new().prefix("small").tempfile()?;
    small.write_all(b"ok")?;

    let (coordinator, renderer) = coordinator(DEAD_URL);
    let handles = coordinator
        .submit_paths(&[oversized.path(), Path::new("/no/such/file"), small.path()])
        .await;

    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].filename, display_name(small.path()));

    let entries = renderer.entries();
    assert_eq!(entries.len(), 2, "{entries:?}");
    let texts: Vec<&str> = entries
        .iter()
        .filter_map(|(_, payload)| match payload {
            RenderPayload::Line { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert!(texts[0].starts_with("file too large"), "{texts:?}");
    assert!(texts[1].starts_with("cannot read file: file"), "{texts:?}");
    Ok(())
}

// -- Per-transfer state --------------------------------------------------------

#[tokio::test]
async fn handle_reports_pending_then_outcome() -> anyhow::Result<()> {
    let (coordinator, _renderer) = coordinator(DEAD_URL);
    let mut handles = coordinator.submit_batch(vec![UploadCandidate::new("a.txt", "abc")]);
    let Some(handle) = handles.pop() else {
        anyhow::bail!("no handle");
    };

    // Spawned but not yet polled on this single-threaded runtime.
    assert_eq!(handle.state(), UploadState::Pending);
    let state = handle.subscribe();

    assert_eq!(handle.outcome().await, UploadState::Failed);
    assert_eq!(*state.borrow(), UploadState::Failed);
    Ok(())
}

#[tokio::test]
async fn wait_idle_returns_once_transfers_finish() -> anyhow::Result<()> {
    let (coordinator, _renderer) = coordinator(DEAD_URL);
    let _handles = coordinator.submit_batch(vec![
        UploadCandidate::new("a.txt", "a"),
        UploadCandidate::new("b.txt", "b"),
    ]);
    assert!(coordinator.progress().is_visible());

    tokio::time::timeout(Duration::from_secs(5), coordinator.progress().wait_idle()).await?;
    assert_eq!(coordinator.progress().outstanding(), 0);
    Ok(())
}
