//! Remembered-credentials configuration.

use serde::{Deserialize, Serialize};

/// Where the "remember me" credential pair is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Whether credentials may be persisted at all. When disabled an
    /// in-memory store is used and nothing survives the process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path to the JSON file holding the remembered credentials.
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store_path: default_store_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_store_path() -> String {
    "data/credentials.json".to_string()
}
