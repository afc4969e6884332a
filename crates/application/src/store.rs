//! Committed token state for one logical session.
//!
//! The store is the single source of truth for "which pair is in use".
//! Memory is committed first and is immediately visible to every clone of
//! the handle; the persistence medium trails behind, best-effort.

use std::sync::Arc;

use tokio::sync::RwLock;
use tollgate_domain::TokenPair;
use tracing::warn;

use crate::ports::TokenPersistence;

/// Thread-safe token store shared by all pipeline invocations.
///
/// Cloning produces another handle to the same committed state.
#[derive(Clone)]
pub struct TokenStore {
    current: Arc<RwLock<Option<TokenPair>>>,
    persistence: Option<Arc<dyn TokenPersistence>>,
}

impl TokenStore {
    /// Creates a store with no durable medium behind it.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            persistence: None,
        }
    }

    /// Creates a store backed by a durable persistence medium.
    ///
    /// Call [`TokenStore::hydrate`] afterwards to pick up a persisted
    /// session.
    #[must_use]
    pub fn with_persistence(persistence: Arc<dyn TokenPersistence>) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            persistence: Some(persistence),
        }
    }

    /// Loads the persisted pair into memory, if one exists.
    ///
    /// A committed in-memory pair is never overwritten by hydration.
    pub async fn hydrate(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        match persistence.load().await {
            Ok(Some(pair)) => {
                let mut current = self.current.write().await;
                if current.is_none() {
                    *current = Some(pair);
                }
            }
            Ok(None) => {}
            Err(error) => {
                warn!(%error, "could not load persisted session; starting anonymous");
            }
        }
    }

    /// Returns the last committed pair.
    pub async fn read(&self) -> Option<TokenPair> {
        self.current.read().await.clone()
    }

    /// Commits a new pair.
    ///
    /// The in-memory commit completes before this function returns, so any
    /// subsequent `read()` from any handle observes the new pair.
    /// Persistence failures degrade to in-memory-only with a warning.
    pub async fn write(&self, pair: TokenPair) {
        {
            let mut current = self.current.write().await;
            *current = Some(pair.clone());
        }
        if let Some(persistence) = &self.persistence
            && let Err(error) = persistence.save(&pair).await
        {
            warn!(%error, "could not persist session; continuing in memory");
        }
    }

    /// Removes the committed pair from memory and the persistence medium.
    pub async fn clear(&self) {
        {
            let mut current = self.current.write().await;
            *current = None;
        }
        if let Some(persistence) = &self.persistence
            && let Err(error) = persistence.clear().await
        {
            warn!(%error, "could not erase persisted session");
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("persistent", &self.persistence.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::PersistenceError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// In-memory persistence double; `fail` makes every operation error.
    #[derive(Default)]
    struct FakePersistence {
        stored: Mutex<Option<TokenPair>>,
        fail: bool,
    }

    impl FakePersistence {
        fn failing() -> Self {
            Self {
                stored: Mutex::new(None),
                fail: true,
            }
        }

        fn seeded(pair: TokenPair) -> Self {
            Self {
                stored: Mutex::new(Some(pair)),
                fail: false,
            }
        }

        fn error() -> PersistenceError {
            PersistenceError::Io(std::io::Error::other("medium unavailable"))
        }
    }

    #[async_trait]
    impl TokenPersistence for FakePersistence {
        async fn load(&self) -> Result<Option<TokenPair>, PersistenceError> {
            if self.fail {
                return Err(Self::error());
            }
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn save(&self, pair: &TokenPair) -> Result<(), PersistenceError> {
            if self.fail {
                return Err(Self::error());
            }
            *self.stored.lock().unwrap() = Some(pair.clone());
            Ok(())
        }

        async fn clear(&self) -> Result<(), PersistenceError> {
            if self.fail {
                return Err(Self::error());
            }
            *self.stored.lock().unwrap() = None;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = TokenStore::in_memory();
        assert_eq!(store.read().await, None);

        store.write(TokenPair::new("A1", "R1")).await;
        assert_eq!(store.read().await, Some(TokenPair::new("A1", "R1")));
    }

    #[tokio::test]
    async fn test_write_visible_through_clone() {
        let store = TokenStore::in_memory();
        let handle = store.clone();

        store.write(TokenPair::new("A1", "R1")).await;
        assert_eq!(handle.read().await, Some(TokenPair::new("A1", "R1")));
    }

    #[tokio::test]
    async fn test_clear_removes_pair() {
        let store = TokenStore::in_memory();
        store.write(TokenPair::new("A1", "R1")).await;
        store.clear().await;
        assert_eq!(store.read().await, None);
    }

    #[tokio::test]
    async fn test_hydrate_loads_persisted_pair() {
        let persistence = Arc::new(FakePersistence::seeded(TokenPair::new("A1", "R1")));
        let store = TokenStore::with_persistence(persistence);

        store.hydrate().await;
        assert_eq!(store.read().await, Some(TokenPair::new("A1", "R1")));
    }

    #[tokio::test]
    async fn test_hydrate_does_not_clobber_committed_pair() {
        let persistence = Arc::new(FakePersistence::seeded(TokenPair::new("OLD", "R0")));
        let store = TokenStore::with_persistence(persistence);

        store.write(TokenPair::new("NEW", "R1")).await;
        store.hydrate().await;
        assert_eq!(store.read().await, Some(TokenPair::new("NEW", "R1")));
    }

    #[tokio::test]
    async fn test_persistence_failure_degrades_to_memory() {
        let store = TokenStore::with_persistence(Arc::new(FakePersistence::failing()));

        store.hydrate().await;
        store.write(TokenPair::new("A1", "R1")).await;
        assert_eq!(store.read().await, Some(TokenPair::new("A1", "R1")));

        store.clear().await;
        assert_eq!(store.read().await, None);
    }

    #[tokio::test]
    async fn test_write_reaches_medium() {
        let persistence = Arc::new(FakePersistence::default());
        let store = TokenStore::with_persistence(Arc::clone(&persistence) as Arc<dyn TokenPersistence>);

        store.write(TokenPair::new("A1", "R1")).await;
        assert_eq!(
            *persistence.stored.lock().unwrap(),
            Some(TokenPair::new("A1", "R1"))
        );

        store.clear().await;
        assert_eq!(*persistence.stored.lock().unwrap(), None);
    }
}
