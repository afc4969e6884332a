//! File-based token persistence.
//!
//! The session lives in a single JSON file with the fixed keys
//! `auth_token` and `refresh_token`. The file holds live credentials, so
//! it is written with owner-only permissions on unix.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tollgate_application::ports::{PersistenceError, TokenPersistence};
use tollgate_domain::TokenPair;
use tracing::debug;

/// Token persistence backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenPersistence {
    path: PathBuf,
}

impl FileTokenPersistence {
    /// Creates a persistence medium at the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a persistence medium at the platform default location.
    ///
    /// Returns `None` when the platform has no data directory (then the
    /// store should run in-memory).
    #[must_use]
    pub fn at_default_location() -> Option<Self> {
        Some(Self::new(Self::default_path()?))
    }

    /// The platform default session file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("tollgate").join("session.json"))
    }

    /// The file path this medium writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(unix)]
    async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
    }

    #[cfg(not(unix))]
    #[allow(clippy::unused_async)]
    async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl TokenPersistence for FileTokenPersistence {
    async fn load(&self) -> Result<Option<TokenPair>, PersistenceError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted session");
                return Ok(None);
            }
            Err(error) => return Err(PersistenceError::Io(error)),
        };

        let pair: TokenPair = serde_json::from_slice(&bytes)
            .map_err(|error| PersistenceError::Serialization(error.to_string()))?;
        Ok(Some(pair))
    }

    async fn save(&self, pair: &TokenPair) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(pair)
            .map_err(|error| PersistenceError::Serialization(error.to_string()))?;
        fs::write(&self.path, &bytes).await?;
        Self::restrict_permissions(&self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(PersistenceError::Io(error)),
        }
    }
}
