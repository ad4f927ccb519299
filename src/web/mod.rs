//! Web API module for mediabox.
//!
//! REST endpoints for accounts and the media library, served with axum.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
