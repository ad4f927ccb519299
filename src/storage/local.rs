//! Local filesystem blob store.
//!
//! Objects are stored in a directory tree that mirrors their remote ids:
//! ```text
//! {base_path}/
//! └── media/
//!     ├── 1/
//!     │   └── ab12cd34-5678-90ab-cdef-123456789012.jpg
//!     └── 2/
//!         └── cd90ab12-3456-7890-abcd-ef1234567890.mp4
//! ```
//! The per-owner folder plays the role of the shard directory.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use super::{check_inline_limit, join_remote_id, validate_remote_id, BlobStore, StoredObject};
use crate::{MediaError, Result};

/// Blob store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Base directory for object storage.
    base_path: PathBuf,
    /// URL prefix under which `base_path` is served.
    base_url: String,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore with the given base path and public URL prefix.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>, base_url: &str) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the full file path for a remote id.
    pub fn get_file_path(&self, remote_id: &str) -> Result<PathBuf> {
        validate_remote_id(remote_id)?;
        Ok(self.base_path.join(remote_id))
    }

    /// Public URL for a remote id.
    pub fn url_for(&self, remote_id: &str) -> String {
        format!("{}/{}", self.base_url, remote_id)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(
        &self,
        content: &[u8],
        folder: &str,
        desired_id: Option<&str>,
    ) -> Result<StoredObject> {
        check_inline_limit(content)?;

        let name = match desired_id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let remote_id = join_remote_id(folder, &name);
        let file_path = self.get_file_path(&remote_id)?;

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&file_path, content).await?;

        tracing::debug!("Stored {} bytes at {:?}", content.len(), file_path);

        Ok(StoredObject {
            url: self.url_for(&remote_id),
            remote_id,
        })
    }

    async fn delete(&self, remote_id: &str) -> Result<bool> {
        let file_path = self.get_file_path(remote_id)?;

        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn rename(&self, from_remote_id: &str, to_remote_id: &str) -> Result<StoredObject> {
        let from_path = self.get_file_path(from_remote_id)?;
        let to_path = self.get_file_path(to_remote_id)?;

        if !fs::try_exists(&from_path).await? {
            return Err(MediaError::Storage(format!(
                "resource not found: {from_remote_id}"
            )));
        }
        if fs::try_exists(&to_path).await? {
            return Err(MediaError::Storage(format!(
                "resource already exists: {to_remote_id}"
            )));
        }

        if let Some(parent) = to_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&from_path, &to_path).await?;

        Ok(StoredObject {
            remote_id: to_remote_id.to_string(),
            url: self.url_for(to_remote_id),
        })
    }

    async fn fetch(&self, remote_id: &str) -> Result<Option<Vec<u8>>> {
        let file_path = self.get_file_path(remote_id)?;

        match fs::read(&file_path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::INLINE_UPLOAD_LIMIT;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, LocalBlobStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path(), "http://localhost/blobs/").unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let storage_path = temp_dir.path().join("blobs");

        assert!(!storage_path.exists());

        let store = LocalBlobStore::new(&storage_path, "http://localhost/blobs").unwrap();

        assert!(storage_path.exists());
        assert_eq!(store.base_path(), storage_path);
    }

    #[tokio::test]
    async fn test_upload_and_fetch() {
        let (_temp_dir, store) = setup_store();
        let content = b"Hello, World!";

        let stored = store
            .upload(content, "media/1", Some("greeting.jpg"))
            .await
            .unwrap();

        assert_eq!(stored.remote_id, "media/1/greeting.jpg");
        assert_eq!(stored.url, "http://localhost/blobs/media/1/greeting.jpg");

        let loaded = store.fetch(&stored.remote_id).await.unwrap();
        assert_eq!(loaded.as_deref(), Some(&content[..]));
    }

    #[tokio::test]
    async fn test_upload_generates_uuid() {
        let (_temp_dir, store) = setup_store();

        let a = store.upload(b"a", "media/1", None).await.unwrap();
        let b = store.upload(b"b", "media/1", None).await.unwrap();

        assert_ne!(a.remote_id, b.remote_id);
        assert!(a.remote_id.starts_with("media/1/"));
        // folder + '/' + 36-char UUID
        assert_eq!(a.remote_id.len(), "media/1/".len() + 36);
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let (_temp_dir, store) = setup_store();
        let content = vec![0u8; INLINE_UPLOAD_LIMIT + 1];

        let result = store.upload(&content, "media/1", None).await;
        assert!(matches!(result, Err(MediaError::Storage(_))));
    }

    #[tokio::test]
    async fn test_upload_rejects_traversal() {
        let (_temp_dir, store) = setup_store();

        let result = store.upload(b"x", "media/1", Some("../../escape")).await;
        assert!(matches!(result, Err(MediaError::Storage(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, store) = setup_store();

        let stored = store.upload(b"to delete", "media/3", None).await.unwrap();
        assert!(store.delete(&stored.remote_id).await.unwrap());
        assert!(store.fetch(&stored.remote_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (_temp_dir, store) = setup_store();

        assert!(!store.delete("media/1/nonexistent.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_rename() {
        let (_temp_dir, store) = setup_store();

        let stored = store
            .upload(b"payload", "media/1", Some("old.png"))
            .await
            .unwrap();
        let renamed = store
            .rename(&stored.remote_id, "media/1/new.png")
            .await
            .unwrap();

        assert_eq!(renamed.remote_id, "media/1/new.png");
        assert_eq!(renamed.url, "http://localhost/blobs/media/1/new.png");
        assert!(store.fetch("media/1/old.png").await.unwrap().is_none());
        assert_eq!(
            store.fetch("media/1/new.png").await.unwrap().as_deref(),
            Some(&b"payload"[..])
        );
    }

    #[tokio::test]
    async fn test_rename_missing_source() {
        let (_temp_dir, store) = setup_store();

        let result = store.rename("media/1/ghost.png", "media/1/new.png").await;
        assert!(matches!(result, Err(MediaError::Storage(_))));
    }

    #[tokio::test]
    async fn test_rename_existing_target() {
        let (_temp_dir, store) = setup_store();

        store.upload(b"a", "media/1", Some("a.png")).await.unwrap();
        store.upload(b"b", "media/1", Some("b.png")).await.unwrap();

        let result = store.rename("media/1/a.png", "media/1/b.png").await;
        assert!(matches!(result, Err(MediaError::Storage(_))));
        assert_eq!(
            store.fetch("media/1/b.png").await.unwrap().as_deref(),
            Some(&b"b"[..])
        );
    }

    #[tokio::test]
    async fn test_binary_content() {
        let (_temp_dir, store) = setup_store();
        let content: Vec<u8> = (0..=255).collect();

        let stored = store.upload(&content, "media/1", None).await.unwrap();
        let loaded = store.fetch(&stored.remote_id).await.unwrap().unwrap();

        assert_eq!(loaded, content);
    }
}
