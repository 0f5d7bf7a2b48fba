//! Transport seam between the protocol logic and the network.
//!
//! [`ApiTransport`] performs exactly one HTTP exchange per call and never
//! interprets status codes; that is the job of [`crate::request`]. The
//! production implementation is [`HttpTransport`] (reqwest with a cookie
//! store); tests use [`mock::MockTransport`].

pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::sync::mpsc;

use spectra_core::result::AppResult;

pub use http::HttpTransport;

/// HTTP methods used by the sharing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single API request, described independently of any HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Unencoded path segments, e.g. `["api", "item", "my path"]`.
    pub segments: Vec<String>,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Build a request for the given method and path segments.
    pub fn new<S: AsRef<str>>(method: Method, segments: &[S]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.as_ref().to_string()).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    /// `GET` shorthand.
    pub fn get<S: AsRef<str>>(segments: &[S]) -> Self {
        Self::new(Method::Get, segments)
    }

    /// `POST` shorthand.
    pub fn post<S: AsRef<str>>(segments: &[S]) -> Self {
        Self::new(Method::Post, segments)
    }

    /// `DELETE` shorthand.
    pub fn delete<S: AsRef<str>>(segments: &[S]) -> Self {
        Self::new(Method::Delete, segments)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Slash-joined path, for logging and matching.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Unparsed body bytes.
    pub body: Bytes,
}

impl RawResponse {
    /// Build a response from a status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A binary payload for the upload leg of a `File` item.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadPayload {
    /// Original file name, sent as the multipart file name.
    pub file_name: String,
    /// MIME type, if known.
    pub mime_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl UploadPayload {
    /// Build a payload from a name and contents.
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: None,
            data: data.into(),
        }
    }

    /// Total number of bytes to stream.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the payload has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for UploadPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPayload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Byte counters emitted by the transport while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes handed to the connection so far.
    pub sent: u64,
    /// Total bytes to send.
    pub total: u64,
}

/// Sending half of the progress channel handed to [`ApiTransport::upload`].
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<TransferProgress>,
}

impl ProgressSender {
    /// Create a progress channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TransferProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report transport-level byte counters. Dropped silently once the
    /// receiving session has reached a terminal state.
    pub fn report(&self, sent: u64, total: u64) {
        let _ = self.tx.send(TransferProgress { sent, total });
    }
}

/// Performs raw HTTP exchanges with credentials (cookies) included.
#[async_trait]
pub trait ApiTransport: Send + Sync + std::fmt::Debug + 'static {
    /// Perform one request. Fails only when no response was received.
    async fn send(&self, request: &ApiRequest) -> AppResult<RawResponse>;

    /// Stream `payload` as multipart `file=<binary>` to `/api/file/{short_path}`,
    /// reporting byte counters through `progress`. Dropping the returned future
    /// aborts the transfer.
    async fn upload(
        &self,
        short_path: &str,
        payload: &UploadPayload,
        progress: ProgressSender,
    ) -> AppResult<RawResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_joins_segments() {
        let req = ApiRequest::post(&["api", "item", "__RANDOM__"]).query("turnstile-token", "t");
        assert_eq!(req.path(), "/api/item/__RANDOM__");
        assert_eq!(req.query, vec![("turnstile-token".to_string(), "t".to_string())]);
    }

    #[tokio::test]
    async fn test_progress_after_receiver_drop_is_ignored() {
        let (tx, rx) = ProgressSender::channel();
        drop(rx);
        tx.report(1, 2);
    }
}
