//! Remembered credentials used for silent re-authentication.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use spectra_core::error::AppError;
use spectra_core::result::AppResult;
use spectra_core::types::Credentials;

/// Storage for the single remembered credential pair.
///
/// Read on startup and on every 401; written only on an explicit login with
/// "remember me"; cleared only on explicit logout.
#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug + 'static {
    /// Load the remembered credentials, if any.
    async fn load(&self) -> AppResult<Option<Credentials>>;

    /// Replace the remembered credentials.
    async fn save(&self, credentials: &Credentials) -> AppResult<()>;

    /// Forget the remembered credentials.
    async fn clear(&self) -> AppResult<()>;
}

/// JSON file store with atomic replace semantics.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    /// Location of the credentials file.
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given file. The file need not exist.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> AppResult<Option<Credentials>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::storage(format!(
                    "Failed to read credentials from {}: {e}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice::<Credentials>(&raw) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(e) => {
                // A corrupt file is treated as "nothing remembered".
                debug!(path = %self.path.display(), error = %e, "Ignoring unreadable credentials file");
                Ok(None)
            }
        }
    }

    async fn save(&self, credentials: &Credentials) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, serde_json::to_vec(credentials)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "Saved remembered credentials");
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<Credentials>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already remembers `credentials`.
    pub fn with(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> AppResult<Option<Credentials>> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, credentials: &Credentials) -> AppResult<()> {
        *self.inner.write().await = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.inner.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("creds.json"));

        assert!(store.load().await.unwrap().is_none());

        let creds = Credentials::new("owner@example.com", "s3cret");
        store.save(&creds).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(creds));
        assert!(!store.temp_path().exists());

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(&path, b"not json").unwrap();
        let store = FileCredentialStore::new(&path);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCredentialStore::with(Credentials::new("a@b.example", "pw"));
        assert!(store.load().await.unwrap().is_some());
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
