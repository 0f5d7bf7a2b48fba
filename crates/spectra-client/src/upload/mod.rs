//! Two-phase upload: create the `File` record, then stream the payload.
//!
//! ```text
//! Idle -> Creating -> AwaitingUpload -> Uploading -> Succeeded | Aborted | Failed
//! ```
//!
//! Progress is split into a 10% slice for record creation and a streaming
//! range clamped at 95%; 100 is reported only once the server acknowledged
//! the payload.

pub mod progress;
pub mod session;
pub mod state;

use spectra_core::result::AppResult;

pub use progress::ProgressTracker;
pub use session::{UploadCanceller, UploadSession};
pub use state::UploadState;

/// Receives upload notifications, in order, from the task driving the session.
pub trait UploadObserver: Send + Sync {
    /// Progress in `[0, 100]`, non-decreasing, never after a terminal state.
    fn on_progress(&self, percent: u8);

    /// Every state transition.
    fn on_state(&self, _state: UploadState) {}

    /// The single terminal transition.
    fn on_terminal(&self, _state: UploadState) {}

    /// Outcome of the best-effort delete issued after a cancellation.
    fn on_cleanup(&self, _result: &AppResult<()>) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl UploadObserver for SilentObserver {
    fn on_progress(&self, _percent: u8) {}
}
