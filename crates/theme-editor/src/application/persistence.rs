//! The persistence boundary.
//!
//! A backend stores exactly one record for the whole site.  `save` overwrites
//! that record entirely (last writer wins at whole-record granularity); there
//! is no per-field patching.  `load` returns whatever is stored, loosely typed,
//! so that the store can overlay it field by field.

use std::path::PathBuf;

use async_trait::async_trait;
use theme_core::{ConfigRecord, RemoteRecord};
use thiserror::Error;

/// Error type for persistence operations.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backend could not be reached or refused the request.
    #[error("persistence backend unavailable: {0}")]
    Unavailable(String),

    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored document is not syntactically valid.
    #[error("stored record could not be decoded: {0}")]
    Decode(String),

    /// The record could not be encoded for storage.
    #[error("record could not be encoded: {0}")]
    Encode(String),
}

/// Interface to the remote store holding the site configuration record.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Fetches the stored record.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<RemoteRecord>, PersistenceError>;

    /// Replaces the stored record with `record`.
    async fn save(&self, record: &ConfigRecord) -> Result<(), PersistenceError>;
}
