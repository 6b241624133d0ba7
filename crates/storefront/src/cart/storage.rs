//! Durable slot backing the cart.
//!
//! The cart is persisted as a single JSON document under [`CART_STORAGE_KEY`].
//! Three backends are provided:
//!
//! - [`SessionCartStorage`]: the shopper's HTTP session (Postgres-backed in production)
//! - [`FileCartStorage`]: a JSON file, used by the CLI
//! - [`MemoryCartStorage`]: an in-process slot for tests

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tower_sessions::Session;

/// Key of the cart slot in every backend.
pub const CART_STORAGE_KEY: &str = "cart";

/// Errors reading or writing the cart slot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A single durable key-value slot holding the serialized cart.
pub trait CartStorage: Send + Sync {
    /// Read the raw payload, `None` when nothing was stored yet.
    fn load(&self) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Replace the stored payload.
    fn save(&self, payload: String) -> impl Future<Output = Result<(), StorageError>> + Send;
}

// =============================================================================
// Session
// =============================================================================

/// Cart slot inside the shopper's session.
///
/// The payload is stored as structured JSON rather than an escaped string so
/// the session record stays readable.
#[derive(Debug, Clone)]
pub struct SessionCartStorage {
    session: Session,
}

impl SessionCartStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartStorage for SessionCartStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        let value: Option<serde_json::Value> = self.session.get(CART_STORAGE_KEY).await?;
        Ok(value.map(|v| v.to_string()))
    }

    async fn save(&self, payload: String) -> Result<(), StorageError> {
        let value: serde_json::Value = serde_json::from_str(&payload)?;
        self.session.insert(CART_STORAGE_KEY, value).await?;
        Ok(())
    }
}

// =============================================================================
// File
// =============================================================================

/// Cart slot stored as `<dir>/cart.json`.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    /// Storage for the cart file inside `dir`. The directory is created on
    /// first save.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{CART_STORAGE_KEY}.json")),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for FileCartStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, payload: String) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write then rename so a crash never leaves a truncated cart behind
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

// =============================================================================
// Memory
// =============================================================================

/// In-process cart slot. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with `payload`.
    #[must_use]
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(payload.into()))),
        }
    }

    /// Current raw payload.
    pub async fn payload(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }
}

impl CartStorage for MemoryCartStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, payload: String) -> Result<(), StorageError> {
        *self.slot.lock().await = Some(payload);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_file_storage_missing_then_saved() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCartStorage::in_dir(dir.path().join("nested"));

        assert!(storage.load().await.unwrap().is_none());

        storage.save("[]".to_string()).await.unwrap();
        assert_eq!(storage.load().await.unwrap().as_deref(), Some("[]"));
        assert!(storage.path().ends_with("cart.json"));
    }

    #[tokio::test]
    async fn test_memory_storage_clones_share_slot() {
        let storage = MemoryCartStorage::new();
        let clone = storage.clone();
        clone.save("[1]".to_string()).await.unwrap();
        assert_eq!(storage.payload().await.as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_session_storage_round_trip() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store, None);
        let storage = SessionCartStorage::new(session.clone());

        assert!(storage.load().await.unwrap().is_none());

        storage
            .save(r#"[{"id":"a","quantity":2}]"#.to_string())
            .await
            .unwrap();

        let raw: Option<serde_json::Value> = session.get(CART_STORAGE_KEY).await.unwrap();
        assert_eq!(raw.unwrap()[0]["quantity"], 2);
        assert!(storage.load().await.unwrap().unwrap().contains("\"id\":\"a\""));
    }
}
