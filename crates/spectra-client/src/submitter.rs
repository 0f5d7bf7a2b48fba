//! Entry points for the three sharing flows: link, paste, file.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use reqwest::Url;
use serde::Serialize;
use tracing::{info, warn};

use spectra_core::config::UploadConfig;
use spectra_core::error::AppError;
use spectra_core::events::ItemChange;
use spectra_core::result::AppResult;
use spectra_core::types::{CreateItemBody, Expiration, ItemKind};

use crate::catalog::ItemCatalog;
use crate::path::{CreateOutcome, PathAllocator};
use crate::request::ApiClient;
use crate::session::{GateDecision, SessionContext};
use crate::transport::{ApiRequest, UploadPayload};
use crate::upload::{UploadCanceller, UploadObserver, UploadSession, UploadState};

/// Options shared by every flow.
#[derive(Debug, Clone, Default)]
pub struct ItemOptions {
    /// Random or caller-chosen path.
    pub path: PathAllocator,
    /// Expiry selection, resolved at submission time.
    pub expiration: Expiration,
    /// Access cap; `None` or `0` means unlimited.
    pub max_visits: Option<u32>,
    /// Access password; `None` or empty means public.
    pub password: Option<String>,
    /// Token from the challenge provider, required for guest writes.
    pub challenge_token: Option<String>,
}

impl ItemOptions {
    fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    fn challenge_token(&self) -> Option<&str> {
        self.challenge_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Input for a `Link` item.
#[derive(Debug, Clone)]
pub struct LinkForm {
    /// Target URL.
    pub target: String,
    /// Share the target even if it does not parse as a URL.
    pub allow_invalid: bool,
}

/// Input for a `Code` item.
#[derive(Debug, Clone)]
pub struct CodeForm {
    /// Text content.
    pub content: String,
    /// Syntax-highlight language, stored as item metadata.
    pub language: Option<String>,
}

/// A successfully shared item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    /// Server-allocated short path.
    pub short_path: String,
    /// Shareable URL, with `?password=` when the item is protected.
    pub url: String,
    /// Item kind.
    pub kind: ItemKind,
}

/// Composes gate, path allocation, resilient requests and uploads.
#[derive(Debug)]
pub struct ItemSubmitter {
    client: ApiClient,
    session: Arc<SessionContext>,
    catalog: Arc<ItemCatalog>,
    origin: Url,
    upload: UploadConfig,
    active_upload: Mutex<Option<UploadCanceller>>,
    failed_upload: Mutex<Option<UploadSession>>,
}

impl ItemSubmitter {
    /// Create a submitter building share URLs on `origin`.
    pub fn new(
        client: ApiClient,
        session: Arc<SessionContext>,
        catalog: Arc<ItemCatalog>,
        origin: Url,
        upload: UploadConfig,
    ) -> Self {
        Self {
            client,
            session,
            catalog,
            origin,
            upload,
            active_upload: Mutex::new(None),
            failed_upload: Mutex::new(None),
        }
    }

    /// Share a link.
    pub async fn submit_link(&self, form: LinkForm, options: &ItemOptions) -> AppResult<Submission> {
        let target = form.target.trim();
        if target.is_empty() {
            return Err(AppError::validation("Link target is required"));
        }
        if !form.allow_invalid && Url::parse(target).is_err() {
            return Err(AppError::validation(format!(
                "'{target}' is not a valid URL; confirm to share it anyway"
            )));
        }

        let (request, path) = self.prepare(ItemKind::Link, target.to_string(), None, options)?;
        let created = CreateOutcome::classify(&self.client.execute(request).await?, &path)
            .into_result()?;
        self.finish(created.short_path, ItemKind::Link, options)
    }

    /// Share pasted text.
    pub async fn submit_code(&self, form: CodeForm, options: &ItemOptions) -> AppResult<Submission> {
        if form.content.trim().is_empty() {
            return Err(AppError::validation("Content must not be empty"));
        }
        let language = form.language.filter(|l| !l.trim().is_empty());

        let (request, path) = self.prepare(ItemKind::Code, form.content, language, options)?;
        let created = CreateOutcome::classify(&self.client.execute(request).await?, &path)
            .into_result()?;
        self.finish(created.short_path, ItemKind::Code, options)
    }

    /// Share a file: create the record, then stream the payload.
    ///
    /// Only one upload may be active at a time; use
    /// [`Self::cancel_active_upload`] to abort it. When streaming fails after
    /// the record was created, the record is kept for
    /// [`Self::discard_failed_upload`].
    pub async fn submit_file(
        &self,
        payload: UploadPayload,
        options: &ItemOptions,
        observer: Arc<dyn UploadObserver>,
    ) -> AppResult<Submission> {
        if payload.file_name.trim().is_empty() {
            return Err(AppError::validation("File name must not be empty"));
        }
        if payload.len() > self.upload.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File is {} bytes; the limit is {} bytes",
                payload.len(),
                self.upload.max_upload_size_bytes
            )));
        }

        let (request, path) =
            self.prepare(ItemKind::File, payload.file_name.clone(), None, options)?;

        let mut upload = UploadSession::new(self.client.clone(), observer);
        let _slot = self.claim_upload_slot(upload.canceller())?;

        let created = upload.create(request, &path).await?;
        if let Err(e) = upload.upload(&payload).await {
            if upload.state() == UploadState::Failed && upload.short_path().is_some() {
                self.retain_failed_upload(upload);
            }
            return Err(e);
        }
        self.finish(created.short_path, ItemKind::File, options)
    }

    /// Cancel the running upload, if any. Returns whether one was running.
    pub fn cancel_active_upload(&self) -> bool {
        match lock(&self.active_upload).as_ref() {
            Some(canceller) => {
                canceller.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether an upload is currently running.
    pub fn has_active_upload(&self) -> bool {
        lock(&self.active_upload).is_some()
    }

    /// Path of the record left behind by the last failed upload.
    pub fn failed_upload_path(&self) -> Option<String> {
        lock(&self.failed_upload)
            .as_ref()
            .and_then(|upload| upload.short_path().map(str::to_string))
    }

    /// Delete the record left behind by the last failed upload.
    ///
    /// Returns the deleted path, or `None` when nothing was left behind.
    pub async fn discard_failed_upload(&self) -> AppResult<Option<String>> {
        let Some(mut upload) = self.take_failed_upload() else {
            return Ok(None);
        };
        let Some(short_path) = upload.short_path().map(str::to_string) else {
            return Ok(None);
        };
        upload.discard().await?;
        self.catalog.notify(ItemChange::Deleted {
            short_path: short_path.clone(),
        });
        Ok(Some(short_path))
    }

    /// Shareable URL for a path: `origin/short_path[?password=..]`.
    pub fn share_url(&self, short_path: &str, password: Option<&str>) -> AppResult<String> {
        let mut url = self.origin.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AppError::internal(format!("Origin '{}' cannot carry a path", self.origin))
            })?;
            segments.pop_if_empty().push(short_path);
        }
        if let Some(password) = password {
            url.query_pairs_mut().append_pair("password", password);
        }
        Ok(url.to_string())
    }

    /// Local checks, gate decision and request construction.
    fn prepare(
        &self,
        kind: ItemKind,
        data: String,
        extra_data: Option<String>,
        options: &ItemOptions,
    ) -> AppResult<(ApiRequest, String)> {
        let gate = self.session.gate();
        let token = options.challenge_token();
        match gate.decide(token.is_some()) {
            GateDecision::Proceed => {}
            GateDecision::ChallengeRequired => {
                return Err(AppError::validation(
                    "Complete the anti-abuse challenge to share as a guest",
                ));
            }
            GateDecision::LoginRequired => {
                return Err(AppError::authentication(
                    "Login required: this server does not accept guest items",
                ));
            }
        }

        let path = options.path.resolve(&gate)?;
        let body = CreateItemBody {
            item_type: kind,
            data,
            expires_at: options.expiration.resolve(Utc::now()),
            max_visits: options.max_visits.filter(|v| *v > 0),
            password: options.password().map(str::to_string),
            extra_data,
        };

        let mut request =
            ApiRequest::post(&["api", "item", path.as_str()]).json(serde_json::to_value(&body)?);
        if let Some(token) = token {
            request = request.query("turnstile-token", token);
        }
        Ok((request, path))
    }

    fn finish(&self, short_path: String, kind: ItemKind, options: &ItemOptions) -> AppResult<Submission> {
        let url = self.share_url(&short_path, options.password())?;
        info!(path = %short_path, %kind, "Item shared");
        self.catalog.notify(ItemChange::Created {
            short_path: short_path.clone(),
            kind,
        });
        Ok(Submission {
            short_path,
            url,
            kind,
        })
    }

    fn retain_failed_upload(&self, upload: UploadSession) {
        if let Some(previous) = lock(&self.failed_upload).replace(upload) {
            warn!(
                path = previous.short_path().unwrap_or_default(),
                "Replacing an undiscarded failed upload"
            );
        }
    }

    fn take_failed_upload(&self) -> Option<UploadSession> {
        lock(&self.failed_upload).take()
    }

    fn claim_upload_slot(&self, canceller: UploadCanceller) -> AppResult<UploadSlot<'_>> {
        let mut active = lock(&self.active_upload);
        if active.is_some() {
            warn!("Rejected second concurrent upload");
            return Err(AppError::validation(
                "An upload is already in progress; cancel it first",
            ));
        }
        *active = Some(canceller);
        Ok(UploadSlot {
            slot: &self.active_upload,
        })
    }
}

/// Releases the active-upload slot when the submission ends.
struct UploadSlot<'a> {
    slot: &'a Mutex<Option<UploadCanceller>>,
}

impl Drop for UploadSlot<'_> {
    fn drop(&mut self) {
        *lock(self.slot) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
