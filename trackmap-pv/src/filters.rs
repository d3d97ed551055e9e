//! Sidebar filters: static bounds and row selection
//!
//! Bounds come from the full catalog and do not move while the session
//! narrows the selection. A selection is the conjunction of cluster
//! membership and inclusive range membership for tempo, energy and
//! danceability.

use crate::catalog::TrackCatalog;
use serde::Serialize;
use std::collections::BTreeSet;
use trackmap_common::AudioFeature;

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A range slider: feature, label and fallback used when the column is absent
#[derive(Debug, Clone, Copy)]
pub struct RangeFilter {
    pub feature: AudioFeature,
    pub label: &'static str,
    pub fallback: Range,
}

/// Range sliders in sidebar order
pub const RANGE_FILTERS: [RangeFilter; 3] = [
    RangeFilter {
        feature: AudioFeature::Tempo,
        label: "Tempo (BPM)",
        fallback: Range::new(0.0, 250.0),
    },
    RangeFilter {
        feature: AudioFeature::Energy,
        label: "Energy",
        fallback: Range::new(0.0, 1.0),
    },
    RangeFilter {
        feature: AudioFeature::Danceability,
        label: "Danceability",
        fallback: Range::new(0.0, 1.0),
    },
];

/// Bounds of one slider
#[derive(Debug, Clone, Serialize)]
pub struct RangeBound {
    pub feature: AudioFeature,
    pub label: &'static str,
    pub bounds: Range,
    /// False when the column is absent and `bounds` is the fallback
    pub present: bool,
}

/// Everything the sidebar needs to draw its widgets
#[derive(Debug, Clone, Serialize)]
pub struct FilterBounds {
    /// Sorted distinct cluster ids
    pub clusters: Vec<i64>,
    pub ranges: Vec<RangeBound>,
}

impl FilterBounds {
    /// Derive bounds from the full catalog
    pub fn from_catalog(catalog: &TrackCatalog) -> Self {
        let ranges = RANGE_FILTERS
            .iter()
            .map(|filter| {
                let observed = catalog
                    .feature_values(filter.feature)
                    .and_then(|values| min_max(values.iter().flatten().copied()));
                RangeBound {
                    feature: filter.feature,
                    label: filter.label,
                    bounds: observed.unwrap_or(filter.fallback),
                    present: catalog.has_feature(filter.feature),
                }
            })
            .collect();

        Self {
            clusters: catalog.distinct_clusters(),
            ranges,
        }
    }

    pub fn range(&self, feature: AudioFeature) -> Option<Range> {
        self.ranges
            .iter()
            .find(|r| r.feature == feature)
            .map(|r| r.bounds)
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<Range> {
    values.fold(None, |acc, v| match acc {
        None => Some(Range::new(v, v)),
        Some(r) => Some(Range::new(r.min.min(v), r.max.max(v))),
    })
}

/// Current user selection
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub clusters: BTreeSet<i64>,
    pub ranges: Vec<(AudioFeature, Range)>,
}

impl FilterState {
    /// Every cluster selected, every slider at its full bounds
    pub fn full(bounds: &FilterBounds) -> Self {
        Self {
            clusters: bounds.clusters.iter().copied().collect(),
            ranges: bounds.ranges.iter().map(|r| (r.feature, r.bounds)).collect(),
        }
    }

    pub fn with_clusters(mut self, clusters: impl IntoIterator<Item = i64>) -> Self {
        self.clusters = clusters.into_iter().collect();
        self
    }

    /// Replace the range for `feature`, adding it if not yet constrained
    pub fn with_range(mut self, feature: AudioFeature, range: Range) -> Self {
        match self.ranges.iter_mut().find(|(f, _)| *f == feature) {
            Some(entry) => entry.1 = range,
            None => self.ranges.push((feature, range)),
        }
        self
    }

    /// Whether `row` passes every predicate
    ///
    /// A range over a column the catalog lacks constrains nothing. A missing
    /// value in a present column fails its range.
    pub fn matches(&self, catalog: &TrackCatalog, row: usize) -> bool {
        let in_cluster = catalog
            .cluster(row)
            .map(|c| self.clusters.contains(&c))
            .unwrap_or(false);
        if !in_cluster {
            return false;
        }

        self.ranges.iter().all(|(feature, range)| {
            if !catalog.has_feature(*feature) {
                return true;
            }
            catalog
                .value(row, *feature)
                .map(|v| range.contains(v))
                .unwrap_or(false)
        })
    }

    /// Indices of matching rows, in dataset order
    pub fn apply(&self, catalog: &TrackCatalog) -> Vec<usize> {
        (0..catalog.len())
            .filter(|&row| self.matches(catalog, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackmap_common::Dataset;

    const CSV: &str = "track_name,tempo,energy,danceability,Cluster\n\
                       a,100,0.2,0.5,0\n\
                       b,120,0.8,0.6,1\n\
                       c,140,0.5,0.9,2\n\
                       d,90,0.9,0.1,1\n\
                       e,160,0.1,0.3,0\n";

    fn catalog(csv: &str) -> TrackCatalog {
        TrackCatalog::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_bounds_from_full_dataset() {
        let bounds = FilterBounds::from_catalog(&catalog(CSV));
        assert_eq!(bounds.clusters, vec![0, 1, 2]);
        assert_eq!(bounds.range(AudioFeature::Tempo), Some(Range::new(90.0, 160.0)));
        assert_eq!(bounds.range(AudioFeature::Energy), Some(Range::new(0.1, 0.9)));
        assert_eq!(bounds.range(AudioFeature::Danceability), Some(Range::new(0.1, 0.9)));
    }

    #[test]
    fn test_bounds_fallback_for_absent_columns() {
        let bounds = FilterBounds::from_catalog(&catalog("valence,Cluster\n0.5,0\n"));
        assert_eq!(bounds.range(AudioFeature::Tempo), Some(Range::new(0.0, 250.0)));
        assert_eq!(bounds.range(AudioFeature::Energy), Some(Range::new(0.0, 1.0)));
        assert_eq!(bounds.range(AudioFeature::Danceability), Some(Range::new(0.0, 1.0)));
        assert!(bounds.ranges.iter().all(|r| !r.present));
    }

    #[test]
    fn test_full_state_is_identity() {
        let c = catalog(CSV);
        let state = FilterState::full(&FilterBounds::from_catalog(&c));
        assert_eq!(state.apply(&c), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cluster_subset() {
        let c = catalog(CSV);
        let state = FilterState::full(&FilterBounds::from_catalog(&c)).with_clusters([1]);
        let rows = state.apply(&c);
        assert_eq!(rows, vec![1, 3]);
        assert!(rows.iter().all(|&r| c.cluster(r) == Some(1)));
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let c = catalog(CSV);
        let state = FilterState::full(&FilterBounds::from_catalog(&c))
            .with_range(AudioFeature::Tempo, Range::new(100.0, 140.0));
        assert_eq!(state.apply(&c), vec![0, 1, 2]);
    }

    #[test]
    fn test_conjunction_of_predicates() {
        let c = catalog(CSV);
        let state = FilterState::full(&FilterBounds::from_catalog(&c))
            .with_clusters([0, 1])
            .with_range(AudioFeature::Energy, Range::new(0.15, 1.0))
            .with_range(AudioFeature::Danceability, Range::new(0.2, 1.0));
        let rows = state.apply(&c);
        assert_eq!(rows, vec![0, 1]);
        for &r in &rows {
            assert!([0, 1].contains(&c.cluster(r).unwrap()));
            assert!(c.value(r, AudioFeature::Energy).unwrap() >= 0.15);
            assert!(c.value(r, AudioFeature::Danceability).unwrap() >= 0.2);
        }
    }

    #[test]
    fn test_empty_cluster_selection() {
        let c = catalog(CSV);
        let state = FilterState::full(&FilterBounds::from_catalog(&c)).with_clusters(Vec::new());
        assert!(state.apply(&c).is_empty());
    }

    #[test]
    fn test_missing_value_fails_range() {
        let c = catalog("tempo,energy,Cluster\n,0.5,0\n120,0.5,0\n");
        let state = FilterState::full(&FilterBounds::from_catalog(&c));
        assert_eq!(state.apply(&c), vec![1]);
    }

    #[test]
    fn test_absent_column_range_unconstrained() {
        let c = catalog("tempo,Cluster\n120,0\n130,0\n");
        let state = FilterState::full(&FilterBounds::from_catalog(&c))
            .with_range(AudioFeature::Energy, Range::new(0.9, 1.0));
        assert_eq!(state.apply(&c), vec![0, 1]);
    }
}
