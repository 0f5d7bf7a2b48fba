//! Path allocation for new items and classification of the create reply.

use tracing::debug;

use spectra_core::error::AppError;
use spectra_core::result::AppResult;
use spectra_core::types::CreatedItem;

use crate::request::ApiResponse;
use crate::session::SessionGate;

/// Path sentinel asking the server to generate a unique path.
pub const RANDOM_PATH: &str = "__RANDOM__";

/// Chooses between a server-generated and a caller-supplied path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAllocator {
    use_random: bool,
    candidate: String,
}

impl PathAllocator {
    /// Allocator that asks for a random path.
    pub fn random() -> Self {
        Self {
            use_random: true,
            candidate: String::new(),
        }
    }

    /// Allocator that asks for `candidate` verbatim.
    pub fn custom(candidate: impl Into<String>) -> Self {
        Self {
            use_random: false,
            candidate: candidate.into(),
        }
    }

    /// Whether a random path will be requested.
    pub fn use_random(&self) -> bool {
        self.use_random
    }

    /// The caller-supplied candidate, kept across submissions for correction.
    pub fn candidate(&self) -> &str {
        &self.candidate
    }

    /// Toggle randomness. Guests cannot turn it off; the setting is left
    /// unchanged and a notice is returned.
    pub fn set_use_random(&mut self, value: bool, gate: &SessionGate) -> AppResult<()> {
        if !value && gate.requires_challenge() {
            debug!("Rejected custom path for guest caller");
            return Err(guest_notice());
        }
        self.use_random = value;
        Ok(())
    }

    /// Replace the caller-supplied candidate.
    pub fn set_candidate(&mut self, candidate: impl Into<String>) {
        self.candidate = candidate.into();
    }

    /// The path segment to send in `POST /api/item/{path}`.
    pub fn resolve(&self, gate: &SessionGate) -> AppResult<String> {
        if self.use_random {
            return Ok(RANDOM_PATH.to_string());
        }
        if gate.requires_challenge() {
            return Err(guest_notice());
        }
        validate_candidate(&self.candidate)?;
        Ok(self.candidate.clone())
    }
}

impl Default for PathAllocator {
    fn default() -> Self {
        Self::random()
    }
}

fn guest_notice() -> AppError {
    AppError::validation("Guests can only share with a random path. Log in to choose your own.")
}

fn validate_candidate(candidate: &str) -> AppResult<()> {
    if candidate.trim().is_empty() {
        return Err(AppError::validation("Custom path must not be empty"));
    }
    if let Some(bad) = candidate.chars().find(|c| matches!(c, '/' | '?' | '#' | '\\')) {
        return Err(AppError::validation(format!(
            "Custom path must not contain '{bad}'"
        )));
    }
    if candidate == "." || candidate == ".." {
        return Err(AppError::validation("Custom path must not be '.' or '..'"));
    }
    if candidate == RANDOM_PATH {
        return Err(AppError::validation(format!(
            "'{RANDOM_PATH}' is reserved; request a random path instead"
        )));
    }
    Ok(())
}

/// What the server said about a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The record exists under the returned path.
    Created(CreatedItem),
    /// The requested path is already taken.
    PathConflict {
        /// Path the caller asked for.
        requested: String,
    },
    /// Anything else, verbatim.
    Unclassified {
        /// HTTP status.
        status: u16,
        /// Server-provided message.
        message: String,
    },
}

impl CreateOutcome {
    /// Classify a create reply for the path that was requested.
    pub fn classify(response: &ApiResponse, requested: &str) -> Self {
        match response.status {
            200 | 201 if response.is_success() => match response.payload::<CreatedItem>() {
                Ok(item) if !item.short_path.is_empty() => Self::Created(item),
                _ => Self::Unclassified {
                    status: response.status,
                    message: "Server accepted the item but returned no path".to_string(),
                },
            },
            409 => Self::PathConflict {
                requested: requested.to_string(),
            },
            status => Self::Unclassified {
                status,
                message: response.message(),
            },
        }
    }

    /// Collapse into the created record or the matching error.
    pub fn into_result(self) -> AppResult<CreatedItem> {
        match self {
            Self::Created(item) => Ok(item),
            Self::PathConflict { requested } => Err(AppError::path_conflict(&requested)),
            Self::Unclassified { status, message } => Err(AppError::unclassified(status, message)),
        }
    }
}
