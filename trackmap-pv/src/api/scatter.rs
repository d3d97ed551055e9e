//! Scatter chart endpoints
//!
//! Both endpoints run the full pipeline per request: filter the catalog,
//! project the selection through the cache, attach coordinates and hover
//! text. Projection work runs on the blocking pool.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;

use super::query::ViewQuery;
use crate::error::{ApiError, ApiResult};
use crate::projection::project;
use crate::render::{build_scatter, render_svg, ScatterChart};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ScatterResponse {
    pub total_tracks: usize,
    /// Tracks left after filtering
    pub showing: usize,
    /// `hit`, `miss` or `read_error`
    pub cache: &'static str,
    pub chart: ScatterChart,
}

/// Filter, project and build the chart for one query
pub async fn scatter_for_query(state: &AppState, query: &ViewQuery) -> ApiResult<ScatterResponse> {
    let filter = query.to_state(&state.bounds)?;
    let catalog = state.catalog.clone();
    let cache = state.cache.clone();

    tokio::task::spawn_blocking(move || -> ApiResult<ScatterResponse> {
        let rows = filter.apply(&catalog);
        let result = project(catalog.dataset(), &rows, catalog.features(), &cache)?;
        debug!(
            "Scatter: {} of {} tracks, cache {}",
            rows.len(),
            catalog.len(),
            result.outcome.as_str()
        );
        let chart = build_scatter(&catalog, &rows, &result.projection)?;
        Ok(ScatterResponse {
            total_tracks: catalog.len(),
            showing: rows.len(),
            cache: result.outcome.as_str(),
            chart,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(format!("projection task failed: {}", e)))?
}

/// GET /api/scatter
pub async fn get_scatter(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<Json<ScatterResponse>> {
    Ok(Json(scatter_for_query(&state, &query).await?))
}

/// GET /api/scatter.svg
pub async fn get_scatter_svg(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<Response> {
    let response = scatter_for_query(&state, &query).await?;
    let svg = render_svg(&response.chart);
    let showing = response.showing.to_string();
    Ok((
        StatusCode::OK,
        [
            ("content-type", "image/svg+xml"),
            ("x-trackmap-showing", showing.as_str()),
        ],
        svg,
    )
        .into_response())
}
