//! Sharing API endpoint configuration.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Where the sharing API lives and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the API host; `/api/...` paths are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Public origin used when building shareable URLs.
    /// Falls back to `base_url` when unset.
    #[serde(default)]
    pub public_origin: Option<String>,
    /// Per-request timeout in seconds (does not apply to uploads).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ServerConfig {
    /// Parsed API base URL.
    pub fn base_url(&self) -> Result<Url, AppError> {
        Url::parse(&self.base_url).map_err(|e| {
            AppError::configuration(format!("Invalid server.base_url '{}': {e}", self.base_url))
        })
    }

    /// Parsed public origin, defaulting to the API base URL.
    pub fn public_origin(&self) -> Result<Url, AppError> {
        match &self.public_origin {
            Some(origin) => Url::parse(origin).map_err(|e| {
                AppError::configuration(format!("Invalid server.public_origin '{origin}': {e}"))
            }),
            None => self.base_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            public_origin: None,
            request_timeout_seconds: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("spectra-client/", env!("CARGO_PKG_VERSION")).to_string()
}
