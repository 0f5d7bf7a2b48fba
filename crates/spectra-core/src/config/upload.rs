//! Binary upload configuration.

use serde::{Deserialize, Serialize};

/// Settings for the streaming leg of a `File` item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Size of each streamed chunk; also the progress resolution.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,
    /// Largest payload accepted before any network call (1 GiB server limit).
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: default_chunk_size(),
            max_upload_size_bytes: default_max_upload_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    64 * 1024
}

fn default_max_upload_size() -> u64 {
    1024 * 1024 * 1024
}
