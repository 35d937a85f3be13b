mod config;
mod session;
mod ws;

use axum::{
    Json, Router,
    routing::{any, get},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::MockConfig;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

pub(crate) struct AppState {
    pub(crate) config: MockConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = MockConfig::from_env()?;
    let addr = config.addr;
    let static_dir = config.static_dir.clone();
    let app = app(Arc::new(AppState { config }));

    info!("mock-wizard-server listening on {}", addr);
    info!("  - WebSocket: ws://{}/", addr);
    if let Some(dir) = static_dir {
        info!("  - UI: http://{}/ui/index.html (from {})", addr, dir.display());
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    let mut router = Router::new()
        .route("/", any(ws::ws_handler))
        .route("/health", get(health))
        .route("/version", get(version))
        .with_state(state);

    if let Some(dir) = static_dir {
        router = router.nest_service("/ui", ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "mock-wizard-server",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "mock-wizard-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}
