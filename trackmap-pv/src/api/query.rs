//! Dashboard query parameters shared by the view endpoints

use serde::Deserialize;
use std::str::FromStr;
use trackmap_common::AudioFeature;

use crate::error::{ApiError, ApiResult};
use crate::filters::{FilterBounds, FilterState, Range, RANGE_FILTERS};

/// Filter selection as sent by the page
///
/// `clusters` is a comma-separated id list: absent selects every cluster,
/// empty selects none. An absent or blank range bound means the full extent.
///
/// Numbers arrive as text so a malformed value is reported as `BAD_REQUEST`
/// in the usual error body instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub clusters: Option<String>,
    pub tempo_min: Option<String>,
    pub tempo_max: Option<String>,
    pub energy_min: Option<String>,
    pub energy_max: Option<String>,
    pub danceability_min: Option<String>,
    pub danceability_max: Option<String>,
    /// Sample table size
    pub n: Option<String>,
}

/// Parse an optional numeric parameter, treating blank as absent
fn parse_param<T: FromStr>(name: &str, raw: Option<&String>) -> ApiResult<Option<T>> {
    let Some(text) = raw.map(|s| s.trim()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    text.parse::<T>()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("invalid value for '{}': '{}'", name, text)))
}

fn parse_bound(name: &str, raw: Option<&String>) -> ApiResult<Option<f64>> {
    match parse_param::<f64>(name, raw)? {
        Some(v) if !v.is_finite() => Err(ApiError::BadRequest(format!(
            "invalid value for '{}': not a finite number",
            name
        ))),
        other => Ok(other),
    }
}

impl ViewQuery {
    fn bounds_for(&self, feature: AudioFeature) -> ApiResult<(Option<f64>, Option<f64>)> {
        let (min, max) = match feature {
            AudioFeature::Tempo => (&self.tempo_min, &self.tempo_max),
            AudioFeature::Energy => (&self.energy_min, &self.energy_max),
            AudioFeature::Danceability => (&self.danceability_min, &self.danceability_max),
            _ => return Ok((None, None)),
        };
        let column = feature.column_name();
        Ok((
            parse_bound(&format!("{}_min", column), min.as_ref())?,
            parse_bound(&format!("{}_max", column), max.as_ref())?,
        ))
    }

    /// Requested sample size before clamping
    pub fn sample_size(&self) -> ApiResult<Option<usize>> {
        parse_param("n", self.n.as_ref())
    }

    /// Resolve the query against the static bounds
    pub fn to_state(&self, bounds: &FilterBounds) -> ApiResult<FilterState> {
        let mut state = FilterState::full(bounds);

        if let Some(list) = &self.clusters {
            let clusters = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<i64>()
                        .map_err(|_| ApiError::BadRequest(format!("invalid cluster id '{}'", s)))
                })
                .collect::<ApiResult<Vec<_>>>()?;
            state = state.with_clusters(clusters);
        }

        for filter in RANGE_FILTERS.iter() {
            let full = bounds.range(filter.feature).unwrap_or(filter.fallback);
            let (min, max) = self.bounds_for(filter.feature)?;
            if min.is_some() || max.is_some() {
                let range = Range::new(min.unwrap_or(full.min), max.unwrap_or(full.max));
                state = state.with_range(filter.feature, range);
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TrackCatalog;
    use trackmap_common::Dataset;

    fn bounds() -> FilterBounds {
        let csv = "tempo,energy,Cluster\n100,0.2,0\n150,0.9,1\n120,0.5,3\n";
        let catalog =
            TrackCatalog::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap();
        FilterBounds::from_catalog(&catalog)
    }

    #[test]
    fn test_empty_query_is_full_state() {
        let b = bounds();
        assert_eq!(ViewQuery::default().to_state(&b).unwrap(), FilterState::full(&b));
    }

    #[test]
    fn test_cluster_list_parsing() {
        let q = ViewQuery {
            clusters: Some("3, 0".to_string()),
            ..Default::default()
        };
        let state = q.to_state(&bounds()).unwrap();
        assert_eq!(state.clusters.into_iter().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn test_empty_cluster_list_selects_none() {
        let q = ViewQuery {
            clusters: Some(String::new()),
            ..Default::default()
        };
        assert!(q.to_state(&bounds()).unwrap().clusters.is_empty());
    }

    #[test]
    fn test_bad_cluster_id() {
        let q = ViewQuery {
            clusters: Some("1,x".to_string()),
            ..Default::default()
        };
        assert!(matches!(q.to_state(&bounds()), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_partial_range_keeps_other_bound() {
        let q = ViewQuery {
            tempo_min: Some("110".to_string()),
            tempo_max: Some(" ".to_string()),
            ..Default::default()
        };
        let state = q.to_state(&bounds()).unwrap();
        let tempo = state
            .ranges
            .iter()
            .find(|(f, _)| *f == AudioFeature::Tempo)
            .map(|(_, r)| *r);
        assert_eq!(tempo, Some(Range::new(110.0, 150.0)));
    }

    #[test]
    fn test_malformed_bound_is_bad_request() {
        let q = ViewQuery {
            energy_max: Some("high".to_string()),
            ..Default::default()
        };
        match q.to_state(&bounds()) {
            Err(ApiError::BadRequest(msg)) => assert!(msg.contains("energy_max")),
            other => panic!("expected BadRequest, got {:?}", other),
        }

        let q = ViewQuery {
            tempo_min: Some("NaN".to_string()),
            ..Default::default()
        };
        assert!(matches!(q.to_state(&bounds()), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_sample_size_parsing() {
        assert_eq!(ViewQuery::default().sample_size().unwrap(), None);

        let q = ViewQuery {
            n: Some("12".to_string()),
            ..Default::default()
        };
        assert_eq!(q.sample_size().unwrap(), Some(12));

        let q = ViewQuery {
            n: Some("-3".to_string()),
            ..Default::default()
        };
        assert!(matches!(q.sample_size(), Err(ApiError::BadRequest(_))));
    }
}
