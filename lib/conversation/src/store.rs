//! Durable storage for serialized transcripts.
//!
//! The session owns a store handle and a key; the store only moves opaque
//! bytes. Two implementations are provided: an in-memory map for tests and
//! embedding, and a directory of JSON files for the CLI.

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Trait for transcript persistence.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Loads the record stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the record stored under `key`.
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Removes the record stored under `key`. Missing records are not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory transcript store.
///
/// Clones share the same underlying map, so a test can keep a handle to
/// inspect what a session persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryTranscriptStore {
    records: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryTranscriptStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the record stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    /// Stores a record directly, bypassing the async API.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.lock().insert(key.into(), data.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map still holds consistent byte records.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        self.insert(key, data);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Transcript store backed by one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    dir: PathBuf,
}

impl FileTranscriptStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path used for `key`.
    ///
    /// Characters outside `[A-Za-z0-9_-]` are replaced so a key can never
    /// escape the store directory.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let write_failed = |e: std::io::Error| StoreError::WriteFailed {
            key: key.to_string(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(write_failed)?;

        // Write to a sibling file and rename so readers never see a torn record.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await.map_err(write_failed)?;
        tokio::fs::rename(&tmp, &path).await.map_err(write_failed)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::WriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
