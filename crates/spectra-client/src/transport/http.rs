//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Url};
use tracing::debug;

use spectra_core::config::ClientConfig;
use spectra_core::error::{AppError, ErrorKind};
use spectra_core::result::AppResult;

use super::{ApiRequest, ApiTransport, Method, ProgressSender, RawResponse, UploadPayload};

/// HTTP transport with a persistent cookie store.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Shared reqwest client; holds the session cookie jar.
    client: Client,
    /// API base URL.
    base_url: Url,
    /// Timeout applied to non-upload requests.
    request_timeout: Duration,
    /// Streaming chunk size.
    chunk_size: usize,
}

impl HttpTransport {
    /// Create a transport from client configuration.
    pub fn new(config: &ClientConfig) -> AppResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(config.server.user_agent.clone())
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self {
            client,
            base_url: config.server.base_url()?,
            request_timeout: Duration::from_secs(config.server.request_timeout_seconds),
            chunk_size: config.upload.chunk_size_bytes.max(1),
        })
    }

    /// Resolve path segments against the base URL, percent-encoding each.
    fn url_for<S: AsRef<str>>(&self, segments: &[S], query: &[(String, String)]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AppError::configuration(format!(
                    "Base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment.as_ref());
            }
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Split a payload into chunks that report progress as they are consumed.
    fn progress_body(&self, data: &Bytes, progress: ProgressSender) -> Body {
        let total = data.len() as u64;
        if data.is_empty() {
            progress.report(0, 0);
        }
        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(self.chunk_size)
            .map(|start| data.slice(start..(start + self.chunk_size).min(data.len())))
            .collect();

        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            progress.report(sent, total);
            Ok::<Bytes, std::io::Error>(chunk)
        }));
        Body::wrap_stream(stream)
    }

    async fn read(response: reqwest::Response) -> Result<RawResponse, reqwest::Error> {
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> AppResult<RawResponse> {
        let url = self.url_for(request.segments.as_slice(), &request.query)?;
        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Delete => self.client.delete(url),
        }
        .timeout(self.request_timeout);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, path = %request.path(), "Sending API request");

        let response = builder.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ServerUnreachable,
                format!("Request to {} failed: {e}", request.path()),
                e,
            )
        })?;

        Self::read(response).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ServerUnreachable,
                format!("Reading response from {} failed: {e}", request.path()),
                e,
            )
        })
    }

    async fn upload(
        &self,
        short_path: &str,
        payload: &UploadPayload,
        progress: ProgressSender,
    ) -> AppResult<RawResponse> {
        let url = self.url_for(&["api", "file", short_path], &[])?;
        let body = self.progress_body(&payload.data, progress);

        let mut part = Part::stream_with_length(body, payload.len())
            .file_name(payload.file_name.clone());
        if let Some(mime) = &payload.mime_type {
            part = part.mime_str(mime).map_err(|e| {
                AppError::validation(format!("Invalid MIME type '{mime}': {e}"))
            })?;
        }
        let form = Form::new().part("file", part);

        debug!(path = %short_path, bytes = payload.len(), "Starting file upload");

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::UploadTransport,
                    format!("Upload to {short_path} failed: {e}"),
                    e,
                )
            })?;

        Self::read(response).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::UploadTransport,
                format!("Reading upload reply for {short_path} failed: {e}"),
                e,
            )
        })
    }
}
