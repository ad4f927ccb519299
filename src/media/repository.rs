//! Media repository for mediabox.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::types::{MediaAsset, MediaType, NewMediaRecord, Pagination};
use crate::{MediaError, Result};

const MEDIA_COLUMNS: &str = "id, owner_id, original_name, stored_name, remote_id, remote_url, \
     content_type, media_type, size_bytes, created_at, updated_at";

/// Repository for media rows.
pub struct MediaRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MediaRepository<'a> {
    /// Create a new MediaRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new row and return it.
    pub async fn create(&self, record: &NewMediaRecord) -> Result<MediaAsset> {
        let result = sqlx::query(
            "INSERT INTO media (owner_id, original_name, stored_name, remote_id, remote_url, \
             content_type, media_type, size_bytes) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.owner_id)
        .bind(&record.original_name)
        .bind(&record.stored_name)
        .bind(&record.remote_id)
        .bind(&record.remote_url)
        .bind(&record.content_type)
        .bind(record.media_type)
        .bind(record.size_bytes)
        .execute(self.pool)
        .await
        .map_err(|e| MediaError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| MediaError::NotFound("media".to_string()))
    }

    /// Get a row by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<MediaAsset>> {
        let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?");
        let result = sqlx::query_as::<_, MediaAsset>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| MediaError::Database(e.to_string()))?;

        Ok(result)
    }

    /// List an owner's media, newest first.
    pub async fn list_by_owner(
        &self,
        owner_id: i64,
        media_type: Option<MediaType>,
        pagination: Pagination,
    ) -> Result<Vec<MediaAsset>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {MEDIA_COLUMNS} FROM media WHERE owner_id = "));
        query.push_bind(owner_id);
        if let Some(media_type) = media_type {
            query.push(" AND media_type = ");
            query.push_bind(media_type);
        }
        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(pagination.limit);
        query.push(" OFFSET ");
        query.push_bind(pagination.offset);

        let items = query
            .build_query_as::<MediaAsset>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| MediaError::Database(e.to_string()))?;

        Ok(items)
    }

    /// Count an owner's media.
    pub async fn count_by_owner(&self, owner_id: i64, media_type: Option<MediaType>) -> Result<i64> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM media WHERE owner_id = ");
        query.push_bind(owner_id);
        if let Some(media_type) = media_type {
            query.push(" AND media_type = ");
            query.push_bind(media_type);
        }

        let count: (i64,) = query
            .build_query_as()
            .fetch_one(self.pool)
            .await
            .map_err(|e| MediaError::Database(e.to_string()))?;

        Ok(count.0)
    }

    /// Point a row at a renamed object.
    pub async fn update_location(
        &self,
        id: i64,
        original_name: &str,
        stored_name: &str,
        remote_id: &str,
        remote_url: &str,
    ) -> Result<Option<MediaAsset>> {
        let result = sqlx::query(
            "UPDATE media SET original_name = ?, stored_name = ?, remote_id = ?, remote_url = ?, \
             updated_at = datetime('now') WHERE id = ?",
        )
        .bind(original_name)
        .bind(stored_name)
        .bind(remote_id)
        .bind(remote_url)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| MediaError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Point a row at replacement content.
    pub async fn update_content(
        &self,
        id: i64,
        remote_id: &str,
        remote_url: &str,
        content_type: &str,
        size_bytes: i64,
    ) -> Result<Option<MediaAsset>> {
        let result = sqlx::query(
            "UPDATE media SET remote_id = ?, remote_url = ?, content_type = ?, size_bytes = ?, \
             updated_at = datetime('now') WHERE id = ?",
        )
        .bind(remote_id)
        .bind(remote_url)
        .bind(content_type)
        .bind(size_bytes)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| MediaError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a row. Returns `false` if it did not exist.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| MediaError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
