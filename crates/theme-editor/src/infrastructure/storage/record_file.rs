//! A persistence backend that keeps the site record in one TOML file.
//!
//! ```toml
//! [colors]
//! siteBg = "#F8FAFC"
//! primaryButton = "#2563EB"
//!
//! [texts]
//! siteName = "Northwind Supply"
//! ```
//!
//! A missing file means nothing has been saved yet.  The file is parsed
//! loosely (any well-formed TOML is accepted) so that hand-edited files with a
//! stray key or a bad color still contribute every field that is valid.
//!
//! Saves write the whole record to a sibling temp file and rename it into
//! place, so a crash mid-save leaves either the old or the new record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use theme_core::{ConfigRecord, RemoteRecord};
use tracing::debug;

use crate::application::persistence::{PersistenceAdapter, PersistenceError};

/// TOML file persistence for the site record.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> PersistenceError {
        debug!("record file I/O failure on {}: {source}", self.path.display());
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl PersistenceAdapter for RecordFile {
    async fn load(&self) -> Result<Option<RemoteRecord>, PersistenceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no record file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        let root: serde_json::Value =
            toml::from_str(&content).map_err(|e| PersistenceError::Decode(e.to_string()))?;
        Ok(Some(RemoteRecord::from_value(root)))
    }

    async fn save(&self, record: &ConfigRecord) -> Result<(), PersistenceError> {
        let content =
            toml::to_string_pretty(record).map_err(|e| PersistenceError::Encode(e.to_string()))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| self.io_error(dir, e))?;
        }

        let tmp = self.path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| self.io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(&self.path, e))?;
        debug!("saved site record to {}", self.path.display());
        Ok(())
    }
}
