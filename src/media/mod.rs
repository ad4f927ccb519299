//! Media library for mediabox.
//!
//! This module provides:
//! - Media asset rows and their repository
//! - Upload acceptance rules (type, size, names)
//! - The catalog coordinating rows with blob store objects

mod catalog;
mod policy;
mod repository;
mod types;

pub use catalog::{MediaCatalog, Replacement};
pub use policy::{
    validate_custom_id, validate_rename, MediaPolicy, MAX_CUSTOM_ID_LENGTH, MAX_NAME_LENGTH,
};
pub use repository::MediaRepository;
pub use types::{
    extension_for, stored_file_name, MediaAsset, MediaType, NewMedia, NewMediaRecord,
    PaginatedResult, Pagination,
};
