//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::json;

use spectra_client::transport::Method;
use spectra_client::transport::mock::MockTransport;
use spectra_client::{
    ItemSubmitter, MemoryCredentialStore, SpectraClient, UploadObserver, UploadState,
};
use spectra_core::config::ClientConfig;
use spectra_core::result::AppResult;
use spectra_core::types::Credentials;

/// Public origin used for share URLs in tests.
pub const ORIGIN: &str = "https://share.example.com";

/// Test application context
pub struct TestApp {
    /// Scripted transport
    pub mock: Arc<MockTransport>,
    /// Remembered credentials
    pub credentials: Arc<MemoryCredentialStore>,
    /// The wired client stack
    pub client: SpectraClient,
}

impl TestApp {
    /// Create a client with nothing remembered
    pub fn new() -> Self {
        Self::build(MemoryCredentialStore::new())
    }

    /// Create a client that remembers `email` / `password`
    pub fn remembering(email: &str, password: &str) -> Self {
        Self::build(MemoryCredentialStore::with(Credentials::new(email, password)))
    }

    fn build(store: MemoryCredentialStore) -> Self {
        let mut config = ClientConfig::default();
        config.server.public_origin = Some(ORIGIN.to_string());

        let mock = Arc::new(MockTransport::new());
        let credentials = Arc::new(store);
        let client =
            SpectraClient::with_transport(&config, mock.clone(), credentials.clone())
                .expect("Failed to build client");
        Self {
            mock,
            credentials,
            client,
        }
    }

    /// Queue `/api/config` with the given guest policy
    pub fn serve_config(&self, guest_write_enabled: bool) -> &Self {
        self.mock.ok(
            Method::Get,
            "/api/config",
            json!({
                "turnstile_enabled": guest_write_enabled,
                "turnstile_site_key": "0x4AAAAAAA",
            }),
        );
        self
    }

    /// Queue `/api/user-info` for a logged-in user, or a 401 for a guest
    pub fn serve_identity(&self, name: Option<&str>) -> &Self {
        match name {
            Some(name) => {
                self.mock
                    .ok(Method::Get, "/api/user-info", json!({ "name": name, "avatar": null }));
            }
            None => {
                self.mock
                    .fail(Method::Get, "/api/user-info", 401, "Unauthorized");
            }
        }
        self
    }

    /// Resolve a logged-in session
    pub async fn as_member(self) -> Self {
        self.serve_config(true).serve_identity(Some("alice"));
        self.client
            .session
            .refresh()
            .await
            .expect("Failed to refresh session");
        self
    }

    /// Resolve a guest session with guest writes enabled
    pub async fn as_guest(self) -> Self {
        self.serve_config(true).serve_identity(None);
        self.client
            .session
            .refresh()
            .await
            .expect("Failed to refresh session");
        self
    }

    /// Item-creation requests sent so far
    pub fn create_requests(&self) -> Vec<spectra_client::transport::ApiRequest> {
        self.mock
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Post && r.segments.get(1).map(String::as_str) == Some("item"))
            .collect()
    }
}

/// One observed upload notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Progress(u8),
    State(UploadState),
    Terminal(UploadState),
    Cleanup(bool),
}

/// Records upload notifications; optionally cancels at a threshold.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Observed>>,
    cancel_at: Option<(u8, Arc<ItemSubmitter>)>,
    cancel_calls: usize,
}

impl RecordingObserver {
    /// Observer that only records
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Observer that cancels the active upload `calls` times once progress reaches `percent`
    pub fn cancelling_at(percent: u8, submitter: Arc<ItemSubmitter>, calls: usize) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            cancel_at: Some((percent, submitter)),
            cancel_calls: calls,
        })
    }

    /// Everything observed, in order
    pub fn events(&self) -> Vec<Observed> {
        self.events.lock().unwrap().clone()
    }

    /// Progress values only
    pub fn progress(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Events recorded after the terminal transition
    pub fn after_terminal(&self) -> Vec<Observed> {
        let events = self.events();
        match events.iter().position(|e| matches!(e, Observed::Terminal(_))) {
            Some(index) => events[index + 1..].to_vec(),
            None => Vec::new(),
        }
    }
}

impl UploadObserver for RecordingObserver {
    fn on_progress(&self, percent: u8) {
        self.events.lock().unwrap().push(Observed::Progress(percent));
        if let Some((threshold, submitter)) = &self.cancel_at {
            if percent >= *threshold {
                for _ in 0..self.cancel_calls {
                    submitter.cancel_active_upload();
                }
            }
        }
    }

    fn on_state(&self, state: UploadState) {
        self.events.lock().unwrap().push(Observed::State(state));
    }

    fn on_terminal(&self, state: UploadState) {
        self.events.lock().unwrap().push(Observed::Terminal(state));
    }

    fn on_cleanup(&self, result: &AppResult<()>) {
        self.events.lock().unwrap().push(Observed::Cleanup(result.is_ok()));
    }
}
