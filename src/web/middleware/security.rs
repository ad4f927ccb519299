//! Security headers middleware.

use axum::{
    body::Body,
    http::{
        header::{self, HeaderName, HeaderValue},
        Request,
    },
    middleware::Next,
    response::Response,
};

/// Headers added to every response.
const SECURITY_HEADERS: [(HeaderName, &str); 3] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
];

/// Prefix under which locally stored media is served.
pub const BLOB_PATH_PREFIX: &str = "/blobs";

/// Security headers middleware.
///
/// API responses are marked `no-store` unless the handler chose a
/// `Cache-Control` value. Media served under [`BLOB_PATH_PREFIX`] keeps
/// whatever caching the file service sets.
pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let is_blob = req.uri().path().starts_with(BLOB_PATH_PREFIX);

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    if !is_blob && !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        );
    }

    response
}
