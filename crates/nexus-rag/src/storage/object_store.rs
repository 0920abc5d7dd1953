//! Object storage boundary
//!
//! The real deployment keeps uploads in a hosted object store; the service
//! only ever talks to this trait. The filesystem implementation mirrors the
//! hosted layout (`<owner>/<uuid>.<ext>`) under a local root.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Raw byte storage for uploaded documents
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes at the given path, creating parent prefixes as needed
    async fn put(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Retrieve the bytes stored at the given path
    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// Remove the object; removing a missing object is not an error
    async fn delete(&self, path: &str) -> Result<()>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Filesystem-backed object store
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        // Paths are generated internally, but reject traversal anyway
        if path.contains("..") || path.starts_with('/') {
            return Err(Error::ObjectStore(format!("invalid object path: {}", path)));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::ObjectStore(format!("create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&full, data)
            .await
            .map_err(|e| Error::ObjectStore(format!("write {}: {}", path, e)))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full)
            .await
            .map_err(|e| Error::ObjectStore(format!("read {}: {}", path, e)))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::ObjectStore(format!("delete {}: {}", path, e))),
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().to_path_buf());

        store.put("user-a/doc.txt", b"contents").await.unwrap();
        assert_eq!(store.get("user-a/doc.txt").await.unwrap(), b"contents");

        store.delete("user-a/doc.txt").await.unwrap();
        assert!(store.get("user-a/doc.txt").await.is_err());
        // Deleting again is fine
        store.delete("user-a/doc.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_object_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().to_path_buf());
        assert!(store.get("nobody/nothing.bin").await.is_err());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().to_path_buf());
        assert!(store.put("../escape.txt", b"x").await.is_err());
        assert!(store.get("/etc/passwd").await.is_err());
    }
}
