//! Client configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! optional TOML files and `SPECTRA__*` environment variables. Each
//! sub-module represents a logical configuration section.

pub mod credentials;
pub mod logging;
pub mod server;
pub mod upload;

use serde::{Deserialize, Serialize};

pub use self::credentials::CredentialsConfig;
pub use self::logging::LoggingConfig;
pub use self::server::ServerConfig;
pub use self::upload::UploadConfig;

use crate::error::AppError;

/// Root client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Sharing API endpoint settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Remembered-credentials settings.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Binary upload settings.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default.toml` with `config/{env}.toml` (both optional)
    /// and environment variables prefixed with `SPECTRA__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SPECTRA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.server.base_url()?;
        self.server.public_origin()?;
        if self.upload.chunk_size_bytes == 0 {
            return Err(AppError::configuration("upload.chunk_size_bytes must be > 0"));
        }
        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "server.request_timeout_seconds must be > 0",
            ));
        }
        Ok(())
    }
}
