//! CORS middleware configuration.

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// Methods used by the auth and media routes.
const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Parse configured origins, dropping values that are not valid header values.
fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|o| match o.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect()
}

/// Create a CORS layer from the `web.cors_origins` setting.
///
/// An empty list allows any origin without credentials. Otherwise only the
/// listed origins are allowed, with credentials.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = parse_origins(origins);

    if allowed.is_empty() {
        return CorsLayer::new()
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(Any)
            .allow_origin(Any);
    }

    CorsLayer::new()
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        .allow_credentials(true)
        .allow_origin(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::patch,
        Router,
    };
    use tower::util::ServiceExt;

    async fn preflight(layer: CorsLayer, origin: &str) -> axum::response::Response {
        let app = Router::new()
            .route("/api/media/rename", patch(|| async { "OK" }))
            .layer(layer);

        app.oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/media/rename")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_parse_origins() {
        let origins = vec![
            "http://localhost:3000".to_string(),
            "bad\norigin".to_string(),
        ];
        assert_eq!(parse_origins(&origins).len(), 1);
        assert!(parse_origins(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_any_origin_when_unconfigured() {
        let response = preflight(create_cors_layer(&[]), "http://example.com").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_listed_origin_allowed() {
        let layer = create_cors_layer(&["http://localhost:5173".to_string()]);
        let response = preflight(layer, "http://localhost:5173").await;

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_unlisted_origin_not_echoed() {
        let layer = create_cors_layer(&["http://localhost:5173".to_string()]);
        let response = preflight(layer, "http://evil.example").await;

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
