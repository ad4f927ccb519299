//! Web server for mediabox.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::{Config, StorageBackend};
use crate::media::MediaPolicy;
use crate::storage::BlobStore;
use crate::{Database, MediaError, Result};

use super::handlers::AppState;
use super::middleware::{security_headers, JwtState};
use super::router::{
    create_blob_router, create_health_router, create_router, create_swagger_router,
};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// CORS allowed origins.
    cors_origins: Vec<String>,
    /// Directory served under `/blobs` when the local backend is active.
    blob_root: Option<PathBuf>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: Database, store: Arc<dyn BlobStore>) -> Result<Self> {
        let web = &config.web;
        let addr = format!("{}:{}", web.host, web.port)
            .parse()
            .map_err(|e| {
                MediaError::Config(format!(
                    "invalid web server address {}:{}: {e}",
                    web.host, web.port
                ))
            })?;

        let app_state = AppState::new(
            db,
            store,
            MediaPolicy::from_config(&config.media),
            &web.jwt_secret,
            web.jwt_expiry_secs,
        )
        .with_dev_mode(web.dev_mode);

        let blob_root = match config.storage.backend {
            StorageBackend::Local => Some(PathBuf::from(&config.storage.local_path)),
            StorageBackend::Cloudinary => None,
        };

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state: Arc::new(JwtState::new(&web.jwt_secret)),
            cors_origins: web.cors_origins.clone(),
            blob_root,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Assemble the full application router.
    pub fn into_router(self) -> Router {
        let mut router = create_router(self.app_state, self.jwt_state, &self.cors_origins)
            .merge(create_health_router())
            .merge(create_swagger_router());

        if let Some(root) = &self.blob_root {
            router = router.merge(create_blob_router(root));
        }

        router
            .layer(middleware::from_fn(security_headers))
            .layer(CompressionLayer::new())
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let addr = self.addr;
        let router = self.into_router();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Web server stopped");
        Ok(())
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let addr = self.addr;
        let router = self.into_router();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
