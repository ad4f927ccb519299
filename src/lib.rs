//! mediabox - media library backend
//!
//! Accounts authenticate with bearer tokens and manage a private library of
//! images and videos. Content lives in a blob store (Cloudinary or a local
//! directory); metadata lives in SQLite.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod media;
pub mod storage;
pub mod web;

pub use auth::{
    hash_password, signup, validate_password, validate_signup, verify_password, PasswordError,
    SignupRequest, ValidationError,
};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{MediaError, Result};
pub use media::{MediaAsset, MediaCatalog, MediaPolicy, MediaType};
pub use storage::{BlobStore, CloudinaryStore, LocalBlobStore};
pub use web::WebServer;
