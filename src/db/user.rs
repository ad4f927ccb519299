//! User model for mediabox.

/// User entity representing a registered account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Display username (unique, case-insensitive).
    pub username: String,
    /// Login email (unique, lowercase).
    pub email: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Account creation timestamp.
    pub created_at: String,
    /// Last modification timestamp.
    pub updated_at: String,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display username.
    pub username: String,
    /// Login email; normalized to lowercase on construction.
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
}

impl NewUser {
    /// Create a new user record.
    pub fn new(
        username: impl Into<String>,
        email: impl AsRef<str>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: normalize_email(email.as_ref()),
            password: password.into(),
        }
    }
}

/// Normalize an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
