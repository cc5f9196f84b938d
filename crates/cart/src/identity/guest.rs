//! Persistence for the guest identifier.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use shopper_core::GuestId;

/// Errors from the guest id store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the state file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but is not a valid guest record.
    #[error("Corrupt guest file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the guest identifier lives between sessions.
#[async_trait]
pub trait GuestIdStore: Send + Sync {
    /// Read the stored guest id, `None` when nothing is stored.
    async fn load(&self) -> Result<Option<GuestId>, StorageError>;

    /// Persist `guest_id`, replacing any stored value.
    async fn save(&self, guest_id: &GuestId) -> Result<(), StorageError>;

    /// Remove the stored guest id. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// On-disk guest record.
#[derive(Debug, Serialize, Deserialize)]
struct GuestRecord {
    guest_id: GuestId,
    created_at: DateTime<Utc>,
}

/// Stores the guest id as a small JSON document.
#[derive(Debug, Clone)]
pub struct FileGuestStore {
    path: PathBuf,
}

impl FileGuestStore {
    /// Store backed by the file at `path`. The parent directory is created
    /// on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl GuestIdStore for FileGuestStore {
    async fn load(&self) -> Result<Option<GuestId>, StorageError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let record: GuestRecord =
            serde_json::from_slice(&contents).map_err(|source| StorageError::Json {
                path: self.path.clone(),
                source,
            })?;

        debug!(created_at = %record.created_at, "loaded persisted guest id");
        Ok(Some(record.guest_id))
    }

    async fn save(&self, guest_id: &GuestId) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let record = GuestRecord {
            guest_id: guest_id.clone(),
            created_at: Utc::now(),
        };
        let contents = serde_json::to_vec_pretty(&record).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;

        // Write then rename so a crash never leaves a half-written record.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Keeps the guest id in memory only.
#[derive(Debug, Default)]
pub struct MemoryGuestStore {
    guest_id: Mutex<Option<GuestId>>,
}

impl MemoryGuestStore {
    /// Store pre-populated with `guest_id`.
    #[must_use]
    pub fn with_guest(guest_id: GuestId) -> Self {
        Self {
            guest_id: Mutex::new(Some(guest_id)),
        }
    }

    /// The currently stored id.
    #[must_use]
    pub fn get(&self) -> Option<GuestId> {
        self.guest_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl GuestIdStore for MemoryGuestStore {
    async fn load(&self) -> Result<Option<GuestId>, StorageError> {
        Ok(self.get())
    }

    async fn save(&self, guest_id: &GuestId) -> Result<(), StorageError> {
        *self
            .guest_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(guest_id.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self
            .guest_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("shopper-guest-{name}-{}", GuestId::generate()))
            .join("guest.json")
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let store = FileGuestStore::new(temp_path("roundtrip"));
        assert!(store.load().await.unwrap().is_none());

        let guest_id = GuestId::generate();
        store.save(&guest_id).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(guest_id));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        // Clearing twice is fine.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_record_format() {
        let store = FileGuestStore::new(temp_path("format"));
        let guest_id = GuestId::parse("abc123").unwrap();
        store.save(&guest_id).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&tokio::fs::read(store.path()).await.unwrap()).unwrap();
        assert_eq!(raw["guest_id"], "abc123");
        assert!(raw["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_record() {
        let store = FileGuestStore::new(temp_path("corrupt"));
        tokio::fs::create_dir_all(store.path().parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(store.path(), br#"{"guest_id": ""}"#)
            .await
            .unwrap();

        assert!(matches!(
            store.load().await,
            Err(StorageError::Json { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryGuestStore::default();
        assert!(store.load().await.unwrap().is_none());

        let guest_id = GuestId::generate();
        store.save(&guest_id).await.unwrap();
        assert_eq!(store.get(), Some(guest_id));

        store.clear().await.unwrap();
        assert!(store.get().is_none());
    }
}
