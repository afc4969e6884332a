//! Token persistence port
//!
//! Defines the interface for the durable session medium. The store treats
//! every failure behind this port as non-fatal: persistence degrades to
//! in-memory-only behavior with a warning.

use async_trait::async_trait;
use tollgate_domain::TokenPair;

/// Errors that can occur in the persistence medium.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable storage for the committed token pair.
#[async_trait]
pub trait TokenPersistence: Send + Sync {
    /// Loads the persisted pair, or `None` when no session is stored.
    ///
    /// # Errors
    /// Returns a [`PersistenceError`] when the medium cannot be read.
    async fn load(&self) -> Result<Option<TokenPair>, PersistenceError>;

    /// Persists the pair, replacing any previous one.
    ///
    /// # Errors
    /// Returns a [`PersistenceError`] when the medium cannot be written.
    async fn save(&self, pair: &TokenPair) -> Result<(), PersistenceError>;

    /// Removes the persisted pair.
    ///
    /// # Errors
    /// Returns a [`PersistenceError`] when the medium cannot be erased.
    async fn clear(&self) -> Result<(), PersistenceError>;
}
