//! Session value and its publishing handle.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use spectra_core::types::{Identity, SiteConfig};

use super::gate::SessionGate;

/// The caller's authentication and guest status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// True until the first refresh against the server finishes.
    pub loading: bool,
    /// The logged-in user, if any.
    pub identity: Option<Identity>,
    /// Server policy: may anonymous callers create items?
    pub guest_write_enabled: bool,
    /// Site key handed to the challenge provider.
    pub challenge_site_key: String,
}

impl Session {
    /// Whether a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Write gate for this snapshot.
    pub fn gate(&self) -> SessionGate {
        SessionGate::new(self.is_authenticated(), self.guest_write_enabled)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            loading: true,
            identity: None,
            guest_write_enabled: false,
            challenge_site_key: String::new(),
        }
    }
}

/// Shared handle publishing the current [`Session`].
///
/// Anyone can read; only this crate can write.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Session>>,
}

impl SessionHandle {
    /// Create a handle holding a fresh, loading session.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx: Arc::new(tx) }
    }

    /// Current session value.
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Receive every future session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub(crate) fn authenticate(&self, identity: Identity) {
        debug!(user = %identity.name, "Session authenticated");
        self.tx.send_modify(|session| {
            session.identity = Some(identity);
            session.loading = false;
        });
    }

    pub(crate) fn reset(&self) {
        self.tx.send_if_modified(|session| {
            let changed = session.identity.is_some() || session.loading;
            session.identity = None;
            session.loading = false;
            changed
        });
    }

    pub(crate) fn apply_config(&self, config: &SiteConfig) {
        self.tx.send_modify(|session| {
            session.guest_write_enabled = config.turnstile_enabled;
            session.challenge_site_key = config.turnstile_site_key.clone();
        });
    }

    pub(crate) fn finish_loading(&self) {
        self.tx.send_if_modified(|session| std::mem::replace(&mut session.loading, false));
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}
