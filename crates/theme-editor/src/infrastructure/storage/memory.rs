//! In-process persistence backend for demos and tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use theme_core::{ConfigRecord, RemoteRecord};
use tokio::sync::Mutex;

use crate::application::persistence::{PersistenceAdapter, PersistenceError};

/// Holds the site record in memory.
///
/// The stored payload is kept as raw JSON, so tests can seed partial or
/// malformed records exactly as a remote backend might return them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    stored: Mutex<Option<Value>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// An empty store: `load` returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `payload`.
    pub fn with_payload(payload: Value) -> Self {
        Self {
            stored: Mutex::new(Some(payload)),
            ..Self::default()
        }
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// The raw payload currently stored.
    pub async fn payload(&self) -> Option<Value> {
        self.stored.lock().await.clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryStore {
    async fn load(&self) -> Result<Option<RemoteRecord>, PersistenceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("memory store: load disabled".to_string()));
        }
        Ok(self.stored.lock().await.clone().map(RemoteRecord::from_value))
    }

    async fn save(&self, record: &ConfigRecord) -> Result<(), PersistenceError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("memory store: save disabled".to_string()));
        }
        let payload = RemoteRecord::from(record).as_value().clone();
        *self.stored.lock().await = Some(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_store_loads_nothing() {
        let store = MemoryStore::new();

        assert!(store.load().await.unwrap().is_none());
        assert_eq!(store.load_count(), 1);
    }

    #[tokio::test]
    async fn test_save_overwrites_whole_record() {
        // Arrange: seeded with an unknown section.
        let store = MemoryStore::with_payload(json!({ "legacy": true }));

        // Act
        store.save(&ConfigRecord::defaults()).await.unwrap();

        // Assert
        let payload = store.payload().await.unwrap();
        assert!(payload.get("legacy").is_none());
        assert_eq!(payload["colors"]["siteBg"], "#F8FAFC");
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_save_keeps_previous_payload() {
        let store = MemoryStore::with_payload(json!({ "texts": { "slogan": "old" } }));
        store.set_fail_saves(true);

        let result = store.save(&ConfigRecord::defaults()).await;

        assert!(matches!(result, Err(PersistenceError::Unavailable(_))));
        assert_eq!(store.payload().await.unwrap()["texts"]["slogan"], "old");
    }

    #[tokio::test]
    async fn test_failing_load_reports_unavailable() {
        let store = MemoryStore::new();
        store.set_fail_loads(true);

        assert!(store.load().await.is_err());
    }
}
