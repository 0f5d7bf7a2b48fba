//! Upload session states.

use serde::Serialize;

/// Where an upload session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UploadState {
    /// No request made yet.
    Idle,
    /// The `File` record is being created.
    Creating,
    /// The record exists, the payload is not attached yet.
    AwaitingUpload,
    /// The payload is streaming.
    Uploading,
    /// The server acknowledged the payload.
    Succeeded,
    /// The caller cancelled.
    Aborted,
    /// Creation or streaming failed.
    Failed,
}

impl UploadState {
    /// Terminal states never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Aborted | Self::Failed)
    }

    /// States from which cancellation is meaningful.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::AwaitingUpload | Self::Uploading)
    }

    /// States in which a server-side record may exist without its payload.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::AwaitingUpload | Self::Uploading)
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Creating => "creating",
            Self::AwaitingUpload => "awaiting-upload",
            Self::Uploading => "uploading",
            Self::Succeeded => "succeeded",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
