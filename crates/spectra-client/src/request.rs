//! Resilient request layer.
//!
//! [`ApiClient::execute`] performs one logical API call:
//! - a body that is not JSON means the backend is not really there
//!   ([`ErrorKind::ServerUnreachable`]), never retried;
//! - a 401 triggers at most one silent re-login with the remembered
//!   credentials, after which the original request is re-issued once;
//! - a 401 that survives that becomes [`ErrorKind::SessionExpired`] and the
//!   session is reset to anonymous;
//! - every other status is handed back for the caller to interpret.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use spectra_core::error::{AppError, ErrorKind};
use spectra_core::result::AppResult;
use spectra_core::types::{Credentials, Identity};

use crate::credentials::CredentialStore;
use crate::session::SessionHandle;
use crate::transport::{ApiRequest, ApiTransport, ProgressSender, RawResponse, UploadPayload};

/// Attempts per logical call: the original plus one after re-login.
const MAX_ATTEMPTS: u32 = 2;

/// HTTP status that asks for authentication.
const UNAUTHORIZED: u16 = 401;

/// A parsed API reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body, normally `{ success, payload }`.
    pub body: Value,
}

impl ApiResponse {
    /// 2xx status and an envelope that does not report failure.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
            && self
                .body
                .get("success")
                .and_then(Value::as_bool)
                .unwrap_or(true)
    }

    /// Deserialize the envelope's `payload`.
    pub fn payload<T: DeserializeOwned>(&self) -> AppResult<T> {
        let payload = self.body.get("payload").cloned().unwrap_or(Value::Null);
        serde_json::from_value(payload).map_err(|e| {
            AppError::with_source(
                ErrorKind::Serialization,
                format!("Unexpected payload shape (status {}): {e}", self.status),
                e,
            )
        })
    }

    /// Server-provided failure message, falling back to the status code.
    pub fn message(&self) -> String {
        match self.body.get("payload") {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            _ => match self.body.get("message").and_then(Value::as_str) {
                Some(message) => message.to_string(),
                None => format!("HTTP {}", self.status),
            },
        }
    }

    /// Turn a non-success reply into an unclassified server error.
    pub fn into_result(self) -> AppResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AppError::unclassified(self.status, self.message()))
        }
    }
}

/// Performs logical API calls over a transport, keeping the session alive.
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
    credentials: Arc<dyn CredentialStore>,
    session: SessionHandle,
}

impl ApiClient {
    /// Create a client over a transport, credential store and session.
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        credentials: Arc<dyn CredentialStore>,
        session: SessionHandle,
    ) -> Self {
        Self {
            transport,
            credentials,
            session,
        }
    }

    /// Perform one logical call with at most one silent re-login.
    pub async fn execute(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        for attempt in 1..=MAX_ATTEMPTS {
            let response = self.execute_once(&request).await?;
            if response.status != UNAUTHORIZED {
                return Ok(response);
            }
            debug!(path = %request.path(), attempt, "Request needs authentication");

            if attempt == MAX_ATTEMPTS {
                break;
            }
            let Some(credentials) = self.remembered().await else {
                break;
            };
            if self.relogin(&credentials).await?.is_none() {
                break;
            }
        }

        warn!(path = %request.path(), "Session expired");
        self.session.reset();
        Err(AppError::session_expired(format!(
            "Authentication required for {}",
            request.path()
        )))
    }

    /// Perform one exchange and parse the body, without re-login.
    pub async fn execute_once(&self, request: &ApiRequest) -> AppResult<ApiResponse> {
        let raw = self.transport.send(request).await?;
        parse(request, raw)
    }

    /// Delete an item by path.
    pub async fn delete_item(&self, short_path: &str) -> AppResult<()> {
        self.execute(ApiRequest::delete(&["api", "item", short_path]))
            .await?
            .into_result()?;
        Ok(())
    }

    /// Stream a binary payload; status interpretation is left to the caller.
    pub async fn upload(
        &self,
        short_path: &str,
        payload: &UploadPayload,
        progress: ProgressSender,
    ) -> AppResult<RawResponse> {
        self.transport.upload(short_path, payload, progress).await
    }

    /// `POST /api/login`, bypassing the re-login loop. Yields the identity,
    /// or the reply that rejected the credentials.
    pub(crate) async fn login(
        &self,
        credentials: &Credentials,
    ) -> AppResult<Result<Identity, ApiResponse>> {
        let request = ApiRequest::post(&["api", "login"]).json(json!({
            "email": credentials.email,
            "password": credentials.password,
        }));
        let response = self.execute_once(&request).await?;
        if !response.is_success() {
            return Ok(Err(response));
        }
        let identity: Identity = response.payload()?;
        self.session.authenticate(identity.clone());
        Ok(Ok(identity))
    }

    async fn relogin(&self, credentials: &Credentials) -> AppResult<Option<Identity>> {
        match self.login(credentials).await? {
            Ok(identity) => {
                info!(user = %identity.name, "Silently re-authenticated");
                Ok(Some(identity))
            }
            Err(rejected) => {
                warn!(status = rejected.status, "Silent re-authentication rejected");
                Ok(None)
            }
        }
    }

    async fn remembered(&self) -> Option<Credentials> {
        match self.credentials.load().await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "Could not read remembered credentials");
                None
            }
        }
    }

    pub(crate) fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }
}

fn parse(request: &ApiRequest, raw: RawResponse) -> AppResult<ApiResponse> {
    let body: Value = serde_json::from_slice(&raw.body).map_err(|e| {
        AppError::with_source(
            ErrorKind::ServerUnreachable,
            format!(
                "{} {} returned a non-JSON body (status {})",
                request.method,
                request.path(),
                raw.status
            ),
            e,
        )
        .with_status(raw.status)
    })?;
    Ok(ApiResponse {
        status: raw.status,
        body,
    })
}
