//! HTTP server for the Q&A assistant

pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use state::AppState;

/// How often idle sessions are swept
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Q&A HTTP server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a new server, building providers and opening the index
    pub async fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Create from pre-built state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes
    fn build_router(&self) -> Router {
        let router = Router::new()
            // Health check
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .nest("/api", routes::api_routes(self.config.server.max_upload_size))
            .with_state(self.state.clone())
            // Middleware layers (order matters - applied bottom to top)
            .layer(RequestBodyLimitLayer::new(self.config.server.max_upload_size))
            .layer(TraceLayer::new_for_http());

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router.layer(cors)
        } else {
            router
        }
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();
        self.spawn_session_sweeper();

        tracing::info!("Starting server on http://{}", addr);
        tracing::info!("API info: http://{}/api/info", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    fn spawn_session_sweeper(&self) {
        let state = self.state.clone();
        let max_idle = Duration::from_secs(self.config.session.idle_timeout_secs);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                state.sessions().prune_idle(max_idle);
            }
        });
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(state: axum::extract::State<AppState>) -> axum::http::StatusCode {
    if state.is_ready().await {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::routes::test_state;
    use crate::testing::ScriptedLlm;
    use axum::extract::State;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ready_when_providers_answer() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Arc::new(ScriptedLlm::new()));
        assert_eq!(readiness(State(state)).await, axum::http::StatusCode::OK);
    }

    #[test]
    fn test_address() {
        let dir = tempfile::tempdir().unwrap();
        let server = RagServer::with_state(test_state(dir.path(), Arc::new(ScriptedLlm::new())));
        assert_eq!(server.address(), "127.0.0.1:5000");
    }
}
