//! Sidebar bounds endpoint

use axum::{extract::State, Json};

use crate::filters::FilterBounds;
use crate::AppState;

/// GET /api/filters
///
/// Cluster ids and slider bounds computed once from the full dataset.
pub async fn get_filters(State(state): State<AppState>) -> Json<FilterBounds> {
    Json(state.bounds.as_ref().clone())
}
