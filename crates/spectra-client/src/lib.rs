//! # spectra-client
//!
//! Client side of the Spectra resource sharing protocol. Lets an
//! application create short-lived shareable items (links, pastes, files)
//! against the sharing API while handling session expiry, guest gating,
//! path collisions, and large binary uploads with progress and
//! cancellation.
//!
//! Layers, leaf first:
//! - [`session`]: the caller's authentication/guest status and the write gate.
//! - [`request`]: one logical API call with at most one silent re-login.
//! - [`path`]: random vs. caller-chosen paths and creation reply classification.
//! - [`upload`]: the create-then-stream state machine.
//! - [`submitter`]: the three end-user flows composed from the above.

pub mod catalog;
pub mod credentials;
pub mod path;
pub mod request;
pub mod session;
pub mod submitter;
pub mod transport;
pub mod upload;

use std::sync::Arc;

use spectra_core::config::ClientConfig;
use spectra_core::result::AppResult;

pub use catalog::ItemCatalog;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use path::{CreateOutcome, PathAllocator, RANDOM_PATH};
pub use request::{ApiClient, ApiResponse};
pub use session::{GateDecision, Session, SessionContext, SessionGate};
pub use submitter::{CodeForm, ItemOptions, ItemSubmitter, LinkForm, Submission};
pub use transport::{ApiTransport, HttpTransport, UploadPayload};
pub use upload::{SilentObserver, UploadCanceller, UploadObserver, UploadSession, UploadState};

/// Everything an application needs, wired from one configuration.
#[derive(Debug, Clone)]
pub struct SpectraClient {
    /// Session owner (login, logout, refresh, gate).
    pub session: Arc<SessionContext>,
    /// Item creation flows.
    pub submitter: Arc<ItemSubmitter>,
    /// Listing, lookup and deletion of existing items.
    pub catalog: Arc<ItemCatalog>,
}

impl SpectraClient {
    /// Build the client stack over the reqwest transport.
    pub fn from_config(config: &ClientConfig) -> AppResult<Self> {
        config.validate()?;
        let transport: Arc<dyn ApiTransport> = Arc::new(HttpTransport::new(config)?);
        let credentials: Arc<dyn CredentialStore> = if config.credentials.enabled {
            Arc::new(FileCredentialStore::new(&config.credentials.store_path))
        } else {
            Arc::new(MemoryCredentialStore::new())
        };
        Self::with_transport(config, transport, credentials)
    }

    /// Build the client stack over an arbitrary transport and credential store.
    pub fn with_transport(
        config: &ClientConfig,
        transport: Arc<dyn ApiTransport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> AppResult<Self> {
        let session = Arc::new(SessionContext::new(transport, credentials));
        let client = session.client().clone();
        let catalog = Arc::new(ItemCatalog::new(client.clone()));
        let submitter = Arc::new(ItemSubmitter::new(
            client,
            Arc::clone(&session),
            Arc::clone(&catalog),
            config.server.public_origin()?,
            config.upload.clone(),
        ));
        Ok(Self {
            session,
            submitter,
            catalog,
        })
    }
}
