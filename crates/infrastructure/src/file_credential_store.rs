use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use portalgate_application::CredentialStore;
use portalgate_core::{AppError, AppResult, BearerToken};
use tracing::warn;

/// Credential store that keeps the bearer token in a single file.
///
/// An empty or whitespace-only file reads as "no token".
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store backed by `path`. The file is created on first store.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn io_error(&self, action: &str, error: &std::io::Error) -> AppError {
        AppError::Internal(format!(
            "failed to {action} credential file '{}': {error}",
            self.path.display()
        ))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> AppResult<Option<BearerToken>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.io_error("read", &error)),
        };

        match BearerToken::new(contents) {
            Ok(token) => Ok(Some(token)),
            Err(_) => {
                warn!(path = %self.path.display(), "credential file is empty");
                Ok(None)
            }
        }
    }

    async fn store(&self, token: BearerToken) -> AppResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| self.io_error("create directory for", &error))?;
        }

        tokio::fs::write(&self.path, token.expose())
            .await
            .map_err(|error| self.io_error("write", &error))
    }

    async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(self.io_error("remove", &error)),
        }
    }
}
