//! Media catalog: keeps database rows and blob store objects in step.
//!
//! Every operation touches two stores that share no transaction. The order of
//! steps is chosen so that a failure never leaves a row pointing at a missing
//! object:
//! - create: upload, then insert; a failed insert deletes the upload again
//! - rename: remote rename, then update; a failed update renames back
//! - replace: upload new, then update, then delete old
//! - delete: remote delete, then row delete
//!
//! Objects that cannot be cleaned up are logged with their remote id.

use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::Database;
use crate::storage::{file_extension, join_remote_id, owner_folder, split_remote_id, BlobStore};
use crate::Result;

use super::repository::MediaRepository;
use super::types::{
    extension_for, MediaAsset, MediaType, NewMedia, NewMediaRecord, PaginatedResult, Pagination,
};

/// Replacement content for an existing asset.
#[derive(Debug, Clone)]
pub struct Replacement {
    /// Name of the uploaded file, used for its extension.
    pub filename: String,
    /// New content.
    pub content: Vec<u8>,
    /// MIME type of the new content.
    pub content_type: String,
}

/// Media operations spanning the database and the blob store.
pub struct MediaCatalog<'a> {
    pool: &'a SqlitePool,
    store: &'a dyn BlobStore,
}

impl<'a> MediaCatalog<'a> {
    /// Create a new MediaCatalog.
    pub fn new(db: &'a Database, store: &'a dyn BlobStore) -> Self {
        Self {
            pool: db.pool(),
            store,
        }
    }

    fn repo(&self) -> MediaRepository<'a> {
        MediaRepository::new(self.pool)
    }

    /// Upload content and record it.
    ///
    /// The remote id is `media/<owner>/<uuid>.<ext>`.
    pub async fn create(&self, media: NewMedia) -> Result<MediaAsset> {
        let extension = file_extension(&media.stored_name)
            .unwrap_or_else(|| extension_for(&media.original_name, &media.content_type));
        let object_name = format!("{}.{}", Uuid::new_v4(), extension);

        let stored = self
            .store
            .upload(
                &media.content,
                &owner_folder(media.owner_id),
                Some(&object_name),
            )
            .await?;

        let record = NewMediaRecord {
            owner_id: media.owner_id,
            original_name: media.original_name,
            stored_name: media.stored_name,
            remote_id: stored.remote_id.clone(),
            remote_url: stored.url,
            content_type: media.content_type,
            media_type: media.media_type,
            size_bytes: media.content.len() as i64,
        };

        match self.repo().create(&record).await {
            Ok(asset) => {
                info!(
                    media_id = asset.id,
                    owner_id = asset.owner_id,
                    remote_id = %asset.remote_id,
                    "Media uploaded"
                );
                Ok(asset)
            }
            Err(e) => {
                self.discard(&stored.remote_id).await;
                Err(e)
            }
        }
    }

    /// Find an asset by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<MediaAsset>> {
        self.repo().get_by_id(id).await
    }

    /// List an owner's assets, newest first.
    pub async fn list_by_owner(
        &self,
        owner_id: i64,
        media_type: Option<MediaType>,
        pagination: Pagination,
    ) -> Result<PaginatedResult<MediaAsset>> {
        let repo = self.repo();
        let items = repo.list_by_owner(owner_id, media_type, pagination).await?;
        let total = repo.count_by_owner(owner_id, media_type).await?;

        Ok(PaginatedResult { items, total })
    }

    /// Give an asset a new name.
    ///
    /// The object moves to a fresh remote id in the same folder, keeping its
    /// extension. Returns `None` if the asset does not exist.
    pub async fn rename(&self, id: i64, new_name: &str) -> Result<Option<MediaAsset>> {
        let Some(asset) = self.repo().get_by_id(id).await? else {
            return Ok(None);
        };

        let (folder, _) = split_remote_id(&asset.remote_id);
        let extension = asset.extension();
        let object_name = match &extension {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let new_remote_id = join_remote_id(folder, &object_name);
        let stored_name = match &extension {
            Some(ext) => format!("{new_name}.{ext}"),
            None => new_name.to_string(),
        };

        let moved = self.store.rename(&asset.remote_id, &new_remote_id).await?;

        let updated = self
            .repo()
            .update_location(id, new_name, &stored_name, &moved.remote_id, &moved.url)
            .await;

        match updated {
            Ok(Some(asset)) => {
                info!(media_id = id, remote_id = %asset.remote_id, "Media renamed");
                Ok(Some(asset))
            }
            Ok(None) => {
                // Row vanished while the object was being moved
                self.discard(&moved.remote_id).await;
                Ok(None)
            }
            Err(e) => {
                if let Err(undo) = self.store.rename(&moved.remote_id, &asset.remote_id).await {
                    error!(
                        media_id = id,
                        remote_id = %moved.remote_id,
                        expected_remote_id = %asset.remote_id,
                        "Failed to move object back after rename failure: {}",
                        undo
                    );
                }
                Err(e)
            }
        }
    }

    /// Swap an asset's content.
    ///
    /// Names are kept; size, content type and location change. Returns
    /// `None` if the asset does not exist.
    pub async fn replace(&self, id: i64, replacement: Replacement) -> Result<Option<MediaAsset>> {
        let Some(asset) = self.repo().get_by_id(id).await? else {
            return Ok(None);
        };

        let extension = file_extension(&replacement.filename)
            .or_else(|| asset.extension())
            .unwrap_or_else(|| extension_for("", &replacement.content_type));
        let object_name = format!("{}.{}", Uuid::new_v4(), extension);
        let (folder, _) = split_remote_id(&asset.remote_id);

        let stored = self
            .store
            .upload(&replacement.content, folder, Some(&object_name))
            .await?;

        let updated = self
            .repo()
            .update_content(
                id,
                &stored.remote_id,
                &stored.url,
                &replacement.content_type,
                replacement.content.len() as i64,
            )
            .await;

        let updated = match updated {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.discard(&stored.remote_id).await;
                return Ok(None);
            }
            Err(e) => {
                self.discard(&stored.remote_id).await;
                return Err(e);
            }
        };

        match self.store.delete(&asset.remote_id).await {
            Ok(_) => {}
            Err(e) => warn!(
                media_id = id,
                remote_id = %asset.remote_id,
                "Orphaned object left after replace: {}",
                e
            ),
        }

        info!(media_id = id, remote_id = %updated.remote_id, "Media replaced");
        Ok(Some(updated))
    }

    /// Delete an asset and its object.
    ///
    /// Returns `false` if the asset does not exist. When the blob store
    /// fails the row is kept and the error returned.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let Some(asset) = self.repo().get_by_id(id).await? else {
            return Ok(false);
        };

        if !self.store.delete(&asset.remote_id).await? {
            warn!(
                media_id = id,
                remote_id = %asset.remote_id,
                "Object was already missing from the blob store"
            );
        }

        let deleted = self.repo().delete(id).await?;
        if deleted {
            info!(media_id = id, owner_id = asset.owner_id, "Media deleted");
        }
        Ok(deleted)
    }

    /// Compensating delete for an object no row refers to.
    async fn discard(&self, remote_id: &str) {
        if let Err(e) = self.store.delete(remote_id).await {
            error!(
                remote_id = %remote_id,
                backend = self.store.backend_name(),
                "Orphaned object needs manual cleanup: {}",
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::storage::{LocalBlobStore, StoredObject};
    use crate::MediaError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Local store that can be told to fail individual operations.
    struct FlakyStore {
        inner: LocalBlobStore,
        fail_delete: bool,
        fail_rename: bool,
    }

    #[async_trait]
    impl BlobStore for FlakyStore {
        async fn upload(
            &self,
            content: &[u8],
            folder: &str,
            desired_id: Option<&str>,
        ) -> Result<StoredObject> {
            self.inner.upload(content, folder, desired_id).await
        }

        async fn delete(&self, remote_id: &str) -> Result<bool> {
            if self.fail_delete {
                return Err(MediaError::Storage("delete unavailable".to_string()));
            }
            self.inner.delete(remote_id).await
        }

        async fn rename(&self, from: &str, to: &str) -> Result<StoredObject> {
            if self.fail_rename {
                return Err(MediaError::Storage("rename unavailable".to_string()));
            }
            self.inner.rename(from, to).await
        }

        async fn fetch(&self, remote_id: &str) -> Result<Option<Vec<u8>>> {
            self.inner.fetch(remote_id).await
        }

        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    struct Fixture {
        _dir: TempDir,
        db: Database,
        store: LocalBlobStore,
        owner: i64,
    }

    async fn setup() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost/blobs").unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let owner = UserRepository::new(db.pool())
            .create(&NewUser::new("owner", "owner@example.com", "pw"))
            .await
            .unwrap()
            .id;
        Fixture {
            _dir: dir,
            db,
            store,
            owner,
        }
    }

    fn jpeg(owner_id: i64, size: usize) -> NewMedia {
        NewMedia {
            owner_id,
            original_name: "photo.jpg".to_string(),
            stored_name: "photo.jpg".to_string(),
            content: vec![0xAB; size],
            content_type: "image/jpeg".to_string(),
            media_type: MediaType::Image,
        }
    }

    fn flaky(fx: &Fixture, fail_delete: bool, fail_rename: bool) -> FlakyStore {
        FlakyStore {
            inner: fx.store.clone(),
            fail_delete,
            fail_rename,
        }
    }

    #[tokio::test]
    async fn test_create() {
        let fx = setup().await;
        let catalog = MediaCatalog::new(&fx.db, &fx.store);

        let asset = catalog.create(jpeg(fx.owner, 2048)).await.unwrap();

        assert_eq!(asset.size_bytes, 2048);
        assert_eq!(asset.media_type, MediaType::Image);
        assert!(asset.remote_id.starts_with(&format!("media/{}/", fx.owner)));
        assert!(asset.remote_id.ends_with(".jpg"));
        assert_eq!(
            fx.store.fetch(&asset.remote_id).await.unwrap().unwrap().len(),
            2048
        );
    }

    #[tokio::test]
    async fn test_create_insert_failure_removes_upload() {
        let fx = setup().await;
        let catalog = MediaCatalog::new(&fx.db, &fx.store);

        // Unknown owner violates the foreign key
        let result = catalog.create(jpeg(999, 16)).await;
        assert!(matches!(result, Err(MediaError::Database(_))));

        let folder = fx.store.base_path().join("media/999");
        let leftovers = std::fs::read_dir(folder)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let fx = setup().await;
        let catalog = MediaCatalog::new(&fx.db, &fx.store);

        catalog.create(jpeg(fx.owner, 1)).await.unwrap();
        catalog.create(jpeg(fx.owner, 2)).await.unwrap();

        let page = catalog
            .list_by_owner(fx.owner, None, Pagination::new(0, 1))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 2);

        let videos = catalog
            .list_by_owner(fx.owner, Some(MediaType::Video), Pagination::new(0, 10))
            .await
            .unwrap();
        assert_eq!(videos.total, 0);
    }

    #[tokio::test]
    async fn test_rename() {
        let fx = setup().await;
        let catalog = MediaCatalog::new(&fx.db, &fx.store);
        let asset = catalog.create(jpeg(fx.owner, 64)).await.unwrap();

        let renamed = catalog
            .rename(asset.id, "vacation")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(renamed.original_name, "vacation");
        assert_eq!(renamed.stored_name, "vacation.jpg");
        assert_ne!(renamed.remote_id, asset.remote_id);
        assert!(renamed.remote_id.ends_with(".jpg"));
        assert_eq!(renamed.size_bytes, asset.size_bytes);
        assert_eq!(renamed.content_type, asset.content_type);

        assert!(fx.store.fetch(&asset.remote_id).await.unwrap().is_none());
        assert!(fx.store.fetch(&renamed.remote_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rename_missing() {
        let fx = setup().await;
        let catalog = MediaCatalog::new(&fx.db, &fx.store);

        assert!(catalog.rename(42, "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rename_storage_failure_keeps_row() {
        let fx = setup().await;
        let asset = MediaCatalog::new(&fx.db, &fx.store)
            .create(jpeg(fx.owner, 8))
            .await
            .unwrap();

        let store = flaky(&fx, false, true);
        let catalog = MediaCatalog::new(&fx.db, &store);

        let result = catalog.rename(asset.id, "nope").await;
        assert!(matches!(result, Err(MediaError::Storage(_))));

        let row = catalog.find_by_id(asset.id).await.unwrap().unwrap();
        assert_eq!(row.original_name, "photo.jpg");
        assert_eq!(row.remote_id, asset.remote_id);
    }

    #[tokio::test]
    async fn test_replace() {
        let fx = setup().await;
        let catalog = MediaCatalog::new(&fx.db, &fx.store);
        let asset = catalog.create(jpeg(fx.owner, 100)).await.unwrap();

        let replaced = catalog
            .replace(
                asset.id,
                Replacement {
                    filename: "new.png".to_string(),
                    content: vec![1; 300],
                    content_type: "image/png".to_string(),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.size_bytes, 300);
        assert_eq!(replaced.content_type, "image/png");
        assert!(replaced.remote_id.ends_with(".png"));
        assert_eq!(replaced.original_name, asset.original_name);
        assert_eq!(replaced.stored_name, asset.stored_name);

        assert!(fx.store.fetch(&asset.remote_id).await.unwrap().is_none());
        assert_eq!(
            fx.store.fetch(&replaced.remote_id).await.unwrap().unwrap(),
            vec![1; 300]
        );
    }

    #[tokio::test]
    async fn test_replace_old_delete_failure_still_succeeds() {
        let fx = setup().await;
        let asset = MediaCatalog::new(&fx.db, &fx.store)
            .create(jpeg(fx.owner, 10))
            .await
            .unwrap();

        let store = flaky(&fx, true, false);
        let catalog = MediaCatalog::new(&fx.db, &store);

        let replaced = catalog
            .replace(
                asset.id,
                Replacement {
                    filename: "next.jpg".to_string(),
                    content: vec![2; 20],
                    content_type: "image/jpeg".to_string(),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.size_bytes, 20);
        // Old object is orphaned, not lost
        assert!(fx.store.fetch(&asset.remote_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete() {
        let fx = setup().await;
        let catalog = MediaCatalog::new(&fx.db, &fx.store);
        let asset = catalog.create(jpeg(fx.owner, 10)).await.unwrap();

        assert!(catalog.delete(asset.id).await.unwrap());
        assert!(catalog.find_by_id(asset.id).await.unwrap().is_none());
        assert!(fx.store.fetch(&asset.remote_id).await.unwrap().is_none());

        assert!(!catalog.delete(asset.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_storage_failure_keeps_row() {
        let fx = setup().await;
        let asset = MediaCatalog::new(&fx.db, &fx.store)
            .create(jpeg(fx.owner, 10))
            .await
            .unwrap();

        let store = flaky(&fx, true, false);
        let catalog = MediaCatalog::new(&fx.db, &store);

        let result = catalog.delete(asset.id).await;
        assert!(matches!(result, Err(MediaError::Storage(_))));
        assert!(catalog.find_by_id(asset.id).await.unwrap().is_some());
    }
}
