//! HTTP API server for the SoulMate gateway

pub mod chat;
pub mod health;
pub mod voice;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::chat::ChatOrchestrator;
use crate::voice::VoiceSelector;

/// Shared state for API handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    pub chat: ChatOrchestrator,
    pub persona_id: String,
    pub persona_name: String,
    /// Voice table, available even when synthesis is not configured
    pub voices: VoiceSelector,
}

impl ApiState {
    #[must_use]
    pub fn new(chat: ChatOrchestrator, persona_id: String, persona_name: String) -> Self {
        let voices = chat
            .voice()
            .map_or_else(VoiceSelector::default, |v| v.selector().clone());
        Self {
            chat,
            persona_id,
            persona_name,
            voices,
        }
    }

    /// Override the voice table shown by `/api/voices`
    #[must_use]
    pub fn with_voices(mut self, voices: VoiceSelector) -> Self {
        self.voices = voices;
        self
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            port,
            static_dir: None,
        }
    }

    /// Set the static files directory for serving the web page
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(chat::router(self.state.clone()))
            .merge(voice::router(self.state.clone()))
            .merge(health::router(self.state.clone()));

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        // CORS layer for cross-origin requests from the web page
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server until interrupted
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
            tracing::error!(addr = %addr, error = %e, "failed to bind API server");
        })?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener until interrupted
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the server stops with an IO failure
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let port = listener.local_addr()?.port();
        tracing::info!(port, "API server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
