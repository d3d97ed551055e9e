//! Sample table endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use super::query::ViewQuery;
use crate::error::ApiResult;
use crate::render::{clamp_sample_size, sample_table};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub total_tracks: usize,
    pub showing: usize,
    /// Effective sample size after clamping
    pub n: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// GET /api/sample
///
/// First `n` tracks of the filtered selection, `n` clamped to 3..=30.
pub async fn get_sample(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<Json<SampleResponse>> {
    let filter = query.to_state(&state.bounds)?;
    let rows = filter.apply(&state.catalog);
    let n = clamp_sample_size(query.sample_size()?);
    let table = sample_table(&state.catalog, &rows, n);

    Ok(Json(SampleResponse {
        total_tracks: state.catalog.len(),
        showing: rows.len(),
        n,
        columns: table.columns,
        rows: table.rows,
    }))
}
