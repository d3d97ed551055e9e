//! Dataset summary endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use trackmap_common::config::CacheKeyPolicy;
use trackmap_common::AudioFeature;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_tracks: usize,
    pub track_column: Option<&'static str>,
    pub artist_column: Option<&'static str>,
    /// Features fed to the projection
    pub features: Vec<AudioFeature>,
    pub clusters: Vec<i64>,
    pub cache_key: CacheKeyPolicy,
}

/// GET /api/summary
pub async fn get_summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    let catalog = &state.catalog;
    Json(SummaryResponse {
        total_tracks: catalog.len(),
        track_column: catalog.track_column(),
        artist_column: catalog.artist_column(),
        features: catalog.features().to_vec(),
        clusters: state.bounds.clusters.clone(),
        cache_key: state.cache.policy(),
    })
}
