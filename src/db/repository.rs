//! User repository for mediabox.
//!
//! This module provides CRUD operations for users in the database.

use sqlx::SqlitePool;

use super::user::{normalize_email, NewUser, User};
use crate::{MediaError, Result};

const USER_COLUMNS: &str = "id, username, email, password, created_at, updated_at";

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID, or `Conflict` when the
    /// email or username is already taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (username, email, password) VALUES (?, ?, ?)")
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password)
            .execute(self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    MediaError::Conflict("user with this email or username already exists".into())
                }
                _ => MediaError::Database(e.to_string()),
            })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| MediaError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| MediaError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(self.pool)
            .await
            .map_err(|e| MediaError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Check if an email is already registered (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(normalize_email(email))
            .fetch_one(self.pool)
            .await
            .map_err(|e| MediaError::Database(e.to_string()))?;
        Ok(exists.0)
    }

    /// Check if a username is already taken (case-insensitive).
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)")
                .bind(username)
                .fetch_one(self.pool)
                .await
                .map_err(|e| MediaError::Database(e.to_string()))?;
        Ok(exists.0)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| MediaError::Database(e.to_string()))?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let new_user = NewUser::new("testuser", "test@example.com", "hashedpw");
        let user = repo.create(&new_user).await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.username, "testuser");
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.password, "hashedpw");
        assert!(!user.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("first", "dup@example.com", "pw"))
            .await
            .unwrap();

        let result = repo
            .create(&NewUser::new("second", "DUP@example.com", "pw"))
            .await;

        assert!(matches!(result, Err(MediaError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_duplicate_username() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("testuser", "a@example.com", "pw"))
            .await
            .unwrap();

        let result = repo
            .create(&NewUser::new("TestUser", "b@example.com", "pw"))
            .await;

        assert!(matches!(result, Err(MediaError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let created = repo
            .create(&NewUser::new("testuser", "test@example.com", "pw"))
            .await
            .unwrap();

        let found = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(found.unwrap().username, "testuser");

        let not_found = repo.get_by_id(999).await.unwrap();
        assert!(not_found.is_none());
    }

    #[tokio::test]
    async fn test_get_by_email_case_insensitive() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("testuser", "Test@Example.com", "pw"))
            .await
            .unwrap();

        let found = repo.get_by_email("TEST@example.COM").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().email, "test@example.com");

        assert!(repo.get_by_email("other@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exists_checks() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        assert!(!repo.email_exists("test@example.com").await.unwrap());
        assert!(!repo.username_exists("testuser").await.unwrap());

        repo.create(&NewUser::new("testuser", "test@example.com", "pw"))
            .await
            .unwrap();

        assert!(repo.email_exists("Test@Example.com").await.unwrap());
        assert!(repo.username_exists("TestUser").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
