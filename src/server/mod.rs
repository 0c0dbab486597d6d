use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::adapters::llm::ProviderSelector;
use crate::adapters::tryon::TryOnProvider;
use crate::config::SharedConfig;
use crate::store::LayeredStore;

pub mod error;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub config: SharedConfig,
    pub store: Arc<LayeredStore>,
    pub selector: Arc<dyn ProviderSelector>,
    pub tryon: Arc<dyn TryOnProvider>,
    /// Shared root for per-job working directories and their sibling
    /// `{jobId}.zip` archives.
    pub generated_root: PathBuf,
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(routes::root))
        .route("/generate-app", post(routes::generate_app))
        .route("/generation-status/{id}", get(routes::generation_status))
        .route("/download/{id}", get(routes::download))
        .route("/setup-api-keys", post(routes::setup_api_keys))
        .route("/try-on", post(routes::try_on))
        .route("/try-on-history", get(routes::try_on_history));

    Router::new()
        // `nest` matches `/api` but not `/api/`; the spec's liveness path is
        // `/api/`, so register it explicitly.
        .route("/api/", get(routes::root))
        .nest("/api", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
}
