//! Unified application error types for Spectra.
//!
//! Every layer of the sharing client maps its failures into [`AppError`]
//! so callers see one error type and one taxonomy. The first seven kinds
//! are the protocol failures a caller has to react to; the rest are
//! ambient (configuration, local I/O, serialization).

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The transport succeeded but the body was not structured data, or the
    /// server could not be reached at all.
    ServerUnreachable,
    /// HTTP 401 persisted after at most one silent re-authentication.
    SessionExpired,
    /// HTTP 409 on item creation: the requested path is taken.
    PathConflict,
    /// Local, pre-network validation failed.
    Validation,
    /// Network failure or non-200 reply while streaming a binary payload.
    UploadTransport,
    /// The caller cancelled an upload.
    UploadAborted,
    /// Any other non-2xx reply, passed through with its status and message.
    UnclassifiedServer,
    /// Explicit login was rejected, or the action needs a logged-in user.
    Authentication,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A local storage I/O error occurred (credential file, payload file).
    Storage,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether the caller can fix the problem locally and resubmit.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PathConflict | Self::Validation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerUnreachable => write!(f, "SERVER_UNREACHABLE"),
            Self::SessionExpired => write!(f, "SESSION_EXPIRED"),
            Self::PathConflict => write!(f, "PATH_CONFLICT"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::UploadTransport => write!(f, "UPLOAD_TRANSPORT"),
            Self::UploadAborted => write!(f, "UPLOAD_ABORTED"),
            Self::UnclassifiedServer => write!(f, "UNCLASSIFIED_SERVER"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Spectra.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// HTTP status that produced the error, when there was one.
    pub status: Option<u16>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach the HTTP status that produced this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Create a server-unreachable error.
    pub fn server_unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerUnreachable, message)
    }

    /// Create a session-expired error.
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionExpired, message).with_status(401)
    }

    /// Create a path-conflict error for the given path.
    pub fn path_conflict(path: &str) -> Self {
        Self::new(
            ErrorKind::PathConflict,
            format!("Path '{path}' is already taken"),
        )
        .with_status(409)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an upload transport error.
    pub fn upload_transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UploadTransport, message)
    }

    /// Create an upload-aborted error.
    pub fn upload_aborted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UploadAborted, message)
    }

    /// Create an unclassified server error carrying the raw status and message.
    pub fn unclassified(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnclassifiedServer, message).with_status(status)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// A sentence suitable for showing to the person using the client.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::ServerUnreachable => {
                "The sharing service is unavailable. Is the backend running?".to_string()
            }
            ErrorKind::SessionExpired => {
                "Your session has expired. Please log in again.".to_string()
            }
            ErrorKind::PathConflict => format!(
                "{}. Choose another path or let the server pick a random one.",
                self.message
            ),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::UploadTransport => format!("Upload failed: {}", self.message),
            ErrorKind::UploadAborted => "Upload cancelled.".to_string(),
            ErrorKind::UnclassifiedServer => match self.status {
                Some(status) => format!("Server error {status}: {}", self.message),
                None => format!("Server error: {}", self.message),
            },
            ErrorKind::Authentication => self.message.clone(),
            ErrorKind::Configuration => format!("Configuration problem: {}", self.message),
            ErrorKind::Serialization | ErrorKind::Storage | ErrorKind::Internal => {
                format!("Unexpected error: {}", self.message)
            }
        }
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            status: self.status,
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = err
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let detail = errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .next()
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{field} {detail}")
            })
            .collect();
        fields.sort();
        Self::validation(fields.join("; "))
    }
}
