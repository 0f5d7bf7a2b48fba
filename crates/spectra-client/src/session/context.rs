//! Single owner of the session: refresh, login, logout.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};
use validator::Validate;

use spectra_core::error::{AppError, ErrorKind};
use spectra_core::result::AppResult;
use spectra_core::types::{Credentials, Identity, SiteConfig};

use crate::credentials::CredentialStore;
use crate::request::ApiClient;
use crate::transport::{ApiRequest, ApiTransport};

use super::gate::SessionGate;
use super::model::{Session, SessionHandle};

/// Owns the [`Session`] and the only API that changes it.
#[derive(Debug)]
pub struct SessionContext {
    client: ApiClient,
    handle: SessionHandle,
}

impl SessionContext {
    /// Create a loading, anonymous session over a transport.
    pub fn new(transport: Arc<dyn ApiTransport>, credentials: Arc<dyn CredentialStore>) -> Self {
        let handle = SessionHandle::new();
        let client = ApiClient::new(transport, credentials, handle.clone());
        Self { client, handle }
    }

    /// The resilient client bound to this session.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Resolve the session against the server's config and identity endpoints.
    ///
    /// An unparseable config reply fails with `ServerUnreachable` before
    /// anything else is attempted. An identity reply that says "not logged
    /// in" leaves the session anonymous.
    pub async fn refresh(&self) -> AppResult<Session> {
        let site = match self.fetch_site_config().await {
            Ok(site) => site,
            Err(e) => {
                self.handle.finish_loading();
                return Err(e);
            }
        };
        self.handle.apply_config(&site);

        match self
            .client
            .execute(ApiRequest::get(&["api", "user-info"]))
            .await
        {
            Ok(response) if response.is_success() => {
                let identity: Identity = response.payload()?;
                self.handle.authenticate(identity);
            }
            Ok(_) => self.handle.reset(),
            Err(e) if e.is(ErrorKind::SessionExpired) => self.handle.reset(),
            Err(e) => {
                self.handle.finish_loading();
                return Err(e);
            }
        }

        let session = self.handle.snapshot();
        info!(
            authenticated = session.is_authenticated(),
            guest_write = session.guest_write_enabled,
            "Session resolved"
        );
        Ok(session)
    }

    /// Log in explicitly. Credentials are remembered only when `remember` is set.
    pub async fn login(&self, credentials: Credentials, remember: bool) -> AppResult<Identity> {
        credentials.validate()?;

        match self.client.login(&credentials).await? {
            Ok(identity) => {
                if remember {
                    self.client.credentials().save(&credentials).await?;
                }
                info!(user = %identity.name, remember, "Logged in");
                Ok(identity)
            }
            Err(rejected) => Err(AppError::authentication(format!(
                "Login failed: {}",
                rejected.message()
            ))
            .with_status(rejected.status)),
        }
    }

    /// Log out, forget remembered credentials and return to anonymous.
    ///
    /// The local reset happens even when the server call fails; that failure
    /// is still returned.
    pub async fn logout(&self) -> AppResult<()> {
        let remote = match self
            .client
            .execute_once(&ApiRequest::post(&["api", "logout"]))
            .await
        {
            Ok(response) => response.into_result().map(|_| ()),
            Err(e) => Err(e),
        };
        let cleared = self.client.credentials().clear().await;
        self.handle.reset();

        if let Err(e) = &remote {
            warn!(error = %e, "Server-side logout failed");
        }
        info!("Logged out");
        remote.and(cleared)
    }

    /// Write gate for the current session.
    pub fn gate(&self) -> SessionGate {
        self.handle.snapshot().gate()
    }

    /// Current session value.
    pub fn snapshot(&self) -> Session {
        self.handle.snapshot()
    }

    /// Receive every future session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.handle.subscribe()
    }

    async fn fetch_site_config(&self) -> AppResult<SiteConfig> {
        let response = self
            .client
            .execute(ApiRequest::get(&["api", "config"]))
            .await?
            .into_result()?;
        response.payload()
    }
}
