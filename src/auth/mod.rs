//! Authentication module for mediabox.
//!
//! This module provides password hashing, input validation and user signup.

mod password;
mod registration;
pub mod validation;

pub use password::{
    hash_password, hash_password_if_changed, validate_password, verify_password, PasswordError,
};
pub use registration::{signup, SignupRequest};
pub use validation::{validate_signup, ValidationError};
