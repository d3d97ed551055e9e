//! trackmap-pv library - Projection Viewer
//!
//! Serves the interactive dashboard over a labeled dataset: sidebar filters,
//! a cached two-component projection of the filtered tracks, the scatter
//! chart and a sample table.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod catalog;
pub mod error;
pub mod filters;
pub mod projection;
pub mod render;

pub use catalog::TrackCatalog;
pub use error::{ApiError, ApiResult};
pub use filters::{FilterBounds, FilterState, Range};
pub use projection::{project, CacheOutcome, Projection, ProjectionCache, ProjectionResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Labeled dataset, immutable for the life of the process
    pub catalog: Arc<TrackCatalog>,
    /// Slider bounds derived once from the full catalog
    pub bounds: Arc<FilterBounds>,
    pub cache: Arc<ProjectionCache>,
}

impl AppState {
    /// Create new application state
    pub fn new(catalog: TrackCatalog, cache: ProjectionCache) -> Self {
        let bounds = FilterBounds::from_catalog(&catalog);
        Self {
            catalog: Arc::new(catalog),
            bounds: Arc::new(bounds),
            cache: Arc::new(cache),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let api = Router::new()
        .route("/api/summary", get(api::get_summary))
        .route("/api/filters", get(api::get_filters))
        .route("/api/scatter", get(api::get_scatter))
        .route("/api/scatter.svg", get(api::get_scatter_svg))
        .route("/api/sample", get(api::get_sample));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::health_routes());

    Router::new()
        .merge(api)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
