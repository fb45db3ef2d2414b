// SPDX-License-Identifier: GPL-3.0-only
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use crate::api::handlers::{ApiHandlers, ApiResponse, FetchRequest, FetchedPayload};
use crate::orchestrator::FetchOrchestrator;

pub struct HttpServer {
    handlers: ApiHandlers,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(orchestrator: Arc<FetchOrchestrator>, addr: SocketAddr) -> Self {
        Self {
            handlers: ApiHandlers::new(orchestrator),
            addr,
        }
    }

    fn router(handlers: Arc<ApiHandlers>) -> Router {
        Router::new()
            .route("/api/health", get(health_handler))
            .route("/api/fetch", post(fetch_handler))
            .with_state(handlers)
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        info!(addr = %self.addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        Self::serve_on(listener, self.handlers).await
    }

    async fn serve_on(listener: tokio::net::TcpListener, handlers: ApiHandlers) -> anyhow::Result<()> {
        let app = Self::router(Arc::new(handlers));
        axum::serve(listener, app).await?;
        Ok(())
    }
}

async fn health_handler() -> Json<ApiResponse<&'static str>> {
    ApiHandlers::health().await
}

async fn fetch_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Json(request): Json<FetchRequest>,
) -> (StatusCode, Json<ApiResponse<FetchedPayload>>) {
    handlers.fetch(Json(request)).await
}
