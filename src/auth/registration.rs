//! User signup for mediabox.

use tracing::info;

use crate::auth::hash_password_if_changed;
use crate::auth::validation::validate_signup;
use crate::db::{NewUser, User, UserRepository};
use crate::{MediaError, Result};

/// Signup request data.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    /// Desired username (3-30 alphanumeric + underscore).
    pub username: String,
    /// Login email.
    pub email: String,
    /// Plaintext password (8-128 characters).
    pub password: String,
}

impl SignupRequest {
    /// Create a new signup request.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Register a new user.
///
/// This function:
/// 1. Validates all input fields
/// 2. Rejects an email or username that is already taken
/// 3. Hashes the password
/// 4. Creates the user in the database
///
/// The repository's unique indexes still guard against a concurrent signup
/// slipping past step 2.
pub async fn signup(repo: &UserRepository<'_>, request: SignupRequest) -> Result<User> {
    validate_signup(&request.username, &request.email, &request.password)?;

    if repo.email_exists(&request.email).await? {
        return Err(MediaError::Conflict(
            "user with this email already exists".to_string(),
        ));
    }
    if repo.username_exists(&request.username).await? {
        return Err(MediaError::Conflict(
            "user with this username already exists".to_string(),
        ));
    }

    let password_hash = hash_password_if_changed(None, &request.password)?;

    let new_user = NewUser::new(&request.username, &request.email, password_hash);
    let user = repo.create(&new_user).await?;

    info!(
        username = %user.username,
        user_id = user.id,
        "New user registered"
    );

    Ok(user)
}
