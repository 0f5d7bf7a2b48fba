//! The create-then-stream state machine.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use spectra_core::error::AppError;
use spectra_core::result::AppResult;
use spectra_core::types::CreatedItem;

use crate::path::CreateOutcome;
use crate::request::{ApiClient, ApiResponse};
use crate::transport::{ApiRequest, ProgressSender, RawResponse, UploadPayload};

use super::UploadObserver;
use super::progress::ProgressTracker;
use super::state::UploadState;

/// Cancels an upload session from another task or from an observer callback.
#[derive(Debug, Clone)]
pub struct UploadCanceller {
    token: CancellationToken,
}

impl UploadCanceller {
    /// Abort the in-flight transfer. Repeated calls are no-ops.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// One `File` submission: record creation, payload streaming, cancellation.
pub struct UploadSession {
    client: ApiClient,
    observer: Arc<dyn UploadObserver>,
    state: UploadState,
    tracker: ProgressTracker,
    short_path: Option<String>,
    token: CancellationToken,
    cleanup_issued: bool,
}

impl std::fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSession")
            .field("state", &self.state)
            .field("short_path", &self.short_path)
            .field("cleanup_issued", &self.cleanup_issued)
            .finish()
    }
}

impl UploadSession {
    /// Create an idle session reporting to `observer`.
    pub fn new(client: ApiClient, observer: Arc<dyn UploadObserver>) -> Self {
        Self {
            client,
            observer,
            state: UploadState::Idle,
            tracker: ProgressTracker::new(),
            short_path: None,
            token: CancellationToken::new(),
            cleanup_issued: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Path allocated by the server, once the record exists.
    pub fn short_path(&self) -> Option<&str> {
        self.short_path.as_deref()
    }

    /// A handle that can cancel this session while it is being driven.
    pub fn canceller(&self) -> UploadCanceller {
        UploadCanceller {
            token: self.token.clone(),
        }
    }

    /// Phase one: create the `File` record.
    ///
    /// A 409 returns the session to `Idle` so the caller can pick another
    /// path; any other failure is terminal.
    pub async fn create(&mut self, request: ApiRequest, requested_path: &str) -> AppResult<CreatedItem> {
        if self.state != UploadState::Idle {
            return Err(AppError::internal(format!(
                "Cannot create a record from state {}",
                self.state
            )));
        }
        self.transition(UploadState::Creating);

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                self.transition(UploadState::Failed);
                return Err(e);
            }
        };

        match CreateOutcome::classify(&response, requested_path) {
            CreateOutcome::Created(item) => {
                info!(path = %item.short_path, "File record created");
                self.short_path = Some(item.short_path.clone());
                self.transition(UploadState::AwaitingUpload);
                let percent = self.tracker.created();
                self.report(percent);
                Ok(item)
            }
            outcome @ CreateOutcome::PathConflict { .. } => {
                self.transition(UploadState::Idle);
                outcome.into_result()
            }
            outcome @ CreateOutcome::Unclassified { .. } => {
                self.transition(UploadState::Failed);
                outcome.into_result()
            }
        }
    }

    /// Phase two: stream the payload to the record created in phase one.
    ///
    /// Returns `UploadAborted` when cancelled through an [`UploadCanceller`];
    /// the cleanup delete has then already been attempted.
    pub async fn upload(&mut self, payload: &UploadPayload) -> AppResult<()> {
        let short_path = match (&self.short_path, self.state) {
            (Some(path), UploadState::AwaitingUpload) => path.clone(),
            _ => {
                return Err(AppError::internal(format!(
                    "Cannot upload from state {}",
                    self.state
                )));
            }
        };
        if self.token.is_cancelled() {
            return self.abort().await;
        }

        self.transition(UploadState::Uploading);
        debug!(path = %short_path, bytes = payload.len(), "Streaming payload");

        let client = self.client.clone();
        let token = self.token.clone();
        let (progress, mut rx) = ProgressSender::channel();
        let mut transfer = Box::pin(client.upload(&short_path, payload, progress));

        let outcome = loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break None,
                Some(step) = rx.recv() => {
                    let percent = self.tracker.transfer(step.sent, step.total);
                    self.report(percent);
                }
                result = &mut transfer => break Some(result),
            }
        };
        drop(transfer);
        if outcome.is_some() {
            // Counters queued in the same poll that finished the transfer.
            while let Ok(step) = rx.try_recv() {
                let percent = self.tracker.transfer(step.sent, step.total);
                self.report(percent);
            }
        }
        drop(rx);

        match outcome {
            None => self.abort().await,
            Some(Ok(raw)) if raw.status == 200 => {
                let percent = self.tracker.complete();
                self.report(percent);
                self.transition(UploadState::Succeeded);
                info!(path = %short_path, "Upload complete");
                Ok(())
            }
            Some(Ok(raw)) => {
                self.transition(UploadState::Failed);
                Err(rejected_upload(&short_path, raw))
            }
            Some(Err(e)) => {
                warn!(path = %short_path, error = %e, "Upload transport failed");
                self.transition(UploadState::Failed);
                Err(e)
            }
        }
    }

    /// Cancel a session that is not currently being driven.
    ///
    /// From `AwaitingUpload` this moves to `Aborted` and deletes the record.
    /// On a terminal session it does nothing. While [`Self::upload`] is
    /// running, use [`Self::canceller`] instead.
    pub async fn cancel(&mut self) -> AppResult<()> {
        match self.state {
            UploadState::AwaitingUpload | UploadState::Uploading => {
                self.token.cancel();
                self.transition(UploadState::Aborted);
                let _ = self.cleanup().await;
                Ok(())
            }
            state if state.is_terminal() => Ok(()),
            state => Err(AppError::validation(format!(
                "Nothing to cancel while {state}"
            ))),
        }
    }

    /// Delete the record left behind by a failed upload.
    pub async fn discard(&mut self) -> AppResult<()> {
        if self.state != UploadState::Failed {
            return Err(AppError::validation(format!(
                "Only a failed upload can be discarded (state is {})",
                self.state
            )));
        }
        self.cleanup().await
    }

    async fn abort(&mut self) -> AppResult<()> {
        self.transition(UploadState::Aborted);
        let _ = self.cleanup().await;
        Err(AppError::upload_aborted(match &self.short_path {
            Some(path) => format!("Upload to '{path}' cancelled"),
            None => "Upload cancelled".to_string(),
        }))
    }

    /// Best-effort delete of the partially created record, at most once.
    async fn cleanup(&mut self) -> AppResult<()> {
        if self.cleanup_issued {
            return Ok(());
        }
        let Some(path) = self.short_path.clone() else {
            return Ok(());
        };
        self.cleanup_issued = true;

        let result = self.client.delete_item(&path).await;
        match &result {
            Ok(()) => info!(path = %path, "Removed partially created item"),
            Err(e) => warn!(path = %path, error = %e, "Cleanup of partially created item failed"),
        }
        self.observer.on_cleanup(&result);
        result
    }

    fn transition(&mut self, next: UploadState) {
        if self.state.is_terminal() {
            return;
        }
        debug!(from = %self.state, to = %next, "Upload state change");
        self.state = next;
        self.observer.on_state(next);
        if next.is_terminal() {
            self.observer.on_terminal(next);
        }
    }

    fn report(&self, percent: Option<u8>) {
        if self.state.is_terminal() {
            return;
        }
        if let Some(percent) = percent {
            self.observer.on_progress(percent);
        }
    }
}

fn rejected_upload(short_path: &str, raw: RawResponse) -> AppError {
    let message = serde_json::from_slice(&raw.body)
        .map(|body| {
            ApiResponse {
                status: raw.status,
                body,
            }
            .message()
        })
        .unwrap_or_else(|_| format!("HTTP {}", raw.status));
    AppError::upload_transport(format!(
        "Server rejected the payload for '{short_path}': {message}"
    ))
    .with_status(raw.status)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;
    use spectra_core::error::ErrorKind;

    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::session::SessionHandle;
    use crate::transport::Method;
    use crate::transport::mock::{MockTransport, MockUpload};

    #[derive(Default)]
    struct Recorder {
        progress: Mutex<Vec<u8>>,
        terminal: Mutex<Vec<UploadState>>,
        cleanups: Mutex<usize>,
    }

    impl UploadObserver for Recorder {
        fn on_progress(&self, percent: u8) {
            self.progress.lock().unwrap().push(percent);
        }

        fn on_terminal(&self, state: UploadState) {
            self.terminal.lock().unwrap().push(state);
        }

        fn on_cleanup(&self, _result: &AppResult<()>) {
            *self.cleanups.lock().unwrap() += 1;
        }
    }

    fn session(mock: &Arc<MockTransport>, recorder: &Arc<Recorder>) -> UploadSession {
        let client = ApiClient::new(
            mock.clone(),
            Arc::new(MemoryCredentialStore::new()),
            SessionHandle::new(),
        );
        UploadSession::new(client, recorder.clone())
    }

    fn create_request() -> ApiRequest {
        ApiRequest::post(&["api", "item", "__RANDOM__"]).json(json!({"item_type": "File"}))
    }

    #[tokio::test]
    async fn test_successful_upload_reports_100_last() {
        let mock = Arc::new(MockTransport::new());
        mock.ok(Method::Post, "/api/item/__RANDOM__", json!({"short_path": "f1le"}))
            .upload(MockUpload::Complete {
                progress: vec![(0, 100), (50, 100), (100, 100)],
                response: RawResponse::new(200, json!({"success": true}).to_string()),
            });
        let recorder = Arc::new(Recorder::default());
        let mut upload = session(&mock, &recorder);

        upload.create(create_request(), "__RANDOM__").await.unwrap();
        assert_eq!(upload.state(), UploadState::AwaitingUpload);
        upload
            .upload(&UploadPayload::new("a.bin", vec![0u8; 100]))
            .await
            .unwrap();

        assert_eq!(upload.state(), UploadState::Succeeded);
        assert_eq!(*recorder.progress.lock().unwrap(), vec![10, 52, 95, 100]);
        assert_eq!(*recorder.terminal.lock().unwrap(), vec![UploadState::Succeeded]);
        assert_eq!(mock.upload_calls(), vec!["f1le".to_string()]);
    }

    #[tokio::test]
    async fn test_conflict_returns_to_idle() {
        let mock = Arc::new(MockTransport::new());
        mock.fail(Method::Post, "/api/item/mine", 409, "Item already exists");
        let recorder = Arc::new(Recorder::default());
        let mut upload = session(&mock, &recorder);

        let request = ApiRequest::post(&["api", "item", "mine"]);
        let err = upload.create(request, "mine").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PathConflict);
        assert_eq!(upload.state(), UploadState::Idle);
        assert!(recorder.terminal.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_200_upload_fails_and_can_be_discarded() {
        let mock = Arc::new(MockTransport::new());
        mock.ok(Method::Post, "/api/item/__RANDOM__", json!({"short_path": "f1le"}))
            .ok(Method::Delete, "/api/item/f1le", json!(null))
            .upload(MockUpload::Complete {
                progress: vec![],
                response: RawResponse::new(
                    413,
                    json!({"success": false, "payload": "Too large"}).to_string(),
                ),
            });
        let recorder = Arc::new(Recorder::default());
        let mut upload = session(&mock, &recorder);

        upload.create(create_request(), "__RANDOM__").await.unwrap();
        let err = upload
            .upload(&UploadPayload::new("a.bin", vec![1u8; 8]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UploadTransport);
        assert_eq!(err.status, Some(413));
        assert_eq!(upload.state(), UploadState::Failed);

        upload.discard().await.unwrap();
        upload.discard().await.unwrap();
        assert_eq!(mock.count(Method::Delete, "/api/item/f1le"), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_awaiting_upload_is_idempotent() {
        let mock = Arc::new(MockTransport::new());
        mock.ok(Method::Post, "/api/item/__RANDOM__", json!({"short_path": "f1le"}))
            .ok(Method::Delete, "/api/item/f1le", json!(null));
        let recorder = Arc::new(Recorder::default());
        let mut upload = session(&mock, &recorder);

        upload.create(create_request(), "__RANDOM__").await.unwrap();
        upload.cancel().await.unwrap();
        upload.cancel().await.unwrap();

        assert_eq!(upload.state(), UploadState::Aborted);
        assert_eq!(mock.count(Method::Delete, "/api/item/f1le"), 1);
        assert_eq!(*recorder.cleanups.lock().unwrap(), 1);
        assert!(mock.upload_calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_create_is_rejected() {
        let mock = Arc::new(MockTransport::new());
        let recorder = Arc::new(Recorder::default());
        let mut upload = session(&mock, &recorder);
        assert!(upload.cancel().await.is_err());
        assert_eq!(upload.state(), UploadState::Idle);
    }
}
