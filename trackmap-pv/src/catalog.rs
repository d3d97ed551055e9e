//! Loaded track catalog
//!
//! Wraps the labeled [`Dataset`] with the columns the viewer needs resolved
//! once at load time: display columns, present features, cluster ids and
//! parsed numeric feature values.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::info;
use trackmap_common::features::{
    ARTIST_NAME_COLUMNS, CLUSTER_COLUMN, PROJECTION_CANDIDATES, TRACK_NAME_COLUMNS,
};
use trackmap_common::{AudioFeature, Dataset, Error, Result};

/// Message shown when none of the projection candidates exist
pub const NO_FEATURES_MESSAGE: &str =
    "No numeric audio features found in dataset. Check column names.";

/// Labeled dataset plus resolved column metadata
#[derive(Debug, Clone)]
pub struct TrackCatalog {
    dataset: Dataset,
    track_column: Option<&'static str>,
    artist_column: Option<&'static str>,
    features: Vec<AudioFeature>,
    clusters: Vec<i64>,
    values: HashMap<AudioFeature, Vec<Option<f64>>>,
}

impl TrackCatalog {
    /// Load a labeled dataset from disk
    pub fn load(path: &Path) -> Result<Self> {
        let dataset = Dataset::load(path)?;
        let catalog = Self::from_dataset(dataset)?;
        info!(
            "Catalog loaded: {} tracks, {} features, {} clusters",
            catalog.len(),
            catalog.features.len(),
            catalog.distinct_clusters().len()
        );
        Ok(catalog)
    }

    /// Resolve columns of an already loaded dataset
    ///
    /// Fails if no projection feature is present or if the `Cluster` column
    /// is absent or holds a non-integer value.
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        let features = dataset.present_features(&PROJECTION_CANDIDATES);
        if features.is_empty() {
            return Err(Error::InvalidInput(NO_FEATURES_MESSAGE.to_string()));
        }

        let cluster_idx = dataset
            .column_index(CLUSTER_COLUMN)
            .ok_or_else(|| Error::MissingColumns(vec![CLUSTER_COLUMN.to_string()]))?;

        let clusters = (0..dataset.len())
            .map(|row| {
                let raw = dataset.cell(row, cluster_idx).unwrap_or("").trim();
                raw.parse::<i64>().map_err(|_| {
                    Error::InvalidInput(format!(
                        "row {} column '{}': '{}' is not an integer cluster id",
                        row + 1,
                        CLUSTER_COLUMN,
                        raw
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let values = PROJECTION_CANDIDATES
            .iter()
            .filter_map(|f| dataset.numeric_column(f.column_name()).map(|v| (*f, v)))
            .collect();

        Ok(Self {
            track_column: dataset.first_present(&TRACK_NAME_COLUMNS),
            artist_column: dataset.first_present(&ARTIST_NAME_COLUMNS),
            dataset,
            features,
            clusters,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Detected display-name column
    pub fn track_column(&self) -> Option<&'static str> {
        self.track_column
    }

    /// Detected artist column
    pub fn artist_column(&self) -> Option<&'static str> {
        self.artist_column
    }

    /// Projection features present in the dataset, in candidate order
    pub fn features(&self) -> &[AudioFeature] {
        &self.features
    }

    pub fn has_feature(&self, feature: AudioFeature) -> bool {
        self.values.contains_key(&feature)
    }

    pub fn cluster(&self, row: usize) -> Option<i64> {
        self.clusters.get(row).copied()
    }

    /// Sorted distinct cluster ids
    pub fn distinct_clusters(&self) -> Vec<i64> {
        self.clusters
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Parsed values of a feature column, `None` if the column is absent
    pub fn feature_values(&self, feature: AudioFeature) -> Option<&[Option<f64>]> {
        self.values.get(&feature).map(Vec::as_slice)
    }

    pub fn value(&self, row: usize, feature: AudioFeature) -> Option<f64> {
        self.values.get(&feature)?.get(row).copied().flatten()
    }

    /// Raw cell text of a named column
    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.dataset.column_index(column)?;
        self.dataset.cell(row, idx)
    }

    pub fn track_name(&self, row: usize) -> Option<&str> {
        self.text(row, self.track_column?)
    }

    pub fn artist_name(&self, row: usize) -> Option<&str> {
        self.text(row, self.artist_column?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(csv: &str) -> Result<TrackCatalog> {
        TrackCatalog::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap())
    }

    #[test]
    fn test_detects_display_columns_by_priority() {
        let c = catalog("title,name,artist,tempo,Cluster\nT,N,A,120,0\n").unwrap();
        assert_eq!(c.track_column(), Some("name"));
        assert_eq!(c.artist_column(), Some("artist"));
        assert_eq!(c.track_name(0), Some("N"));
        assert_eq!(c.artist_name(0), Some("A"));
    }

    #[test]
    fn test_missing_display_columns_degrade() {
        let c = catalog("tempo,energy,Cluster\n120,0.5,1\n").unwrap();
        assert_eq!(c.track_column(), None);
        assert_eq!(c.track_name(0), None);
        assert_eq!(c.artist_name(0), None);
    }

    #[test]
    fn test_features_in_candidate_order() {
        let c = catalog("popularity,tempo,danceability,Cluster\n50,120,0.5,0\n").unwrap();
        assert_eq!(
            c.features(),
            &[AudioFeature::Danceability, AudioFeature::Tempo, AudioFeature::Popularity]
        );
        assert!(c.has_feature(AudioFeature::Tempo));
        assert!(!c.has_feature(AudioFeature::Energy));
    }

    #[test]
    fn test_no_features_is_hard_error() {
        let err = catalog("track_name,Cluster\nA,0\n").unwrap_err();
        assert!(err.to_string().contains(NO_FEATURES_MESSAGE));
    }

    #[test]
    fn test_missing_cluster_column() {
        let err = catalog("tempo\n120\n").unwrap_err();
        assert!(matches!(err, Error::MissingColumns(_)));
    }

    #[test]
    fn test_bad_cluster_value() {
        let err = catalog("tempo,Cluster\n120,x\n").unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_distinct_clusters_sorted() {
        let c = catalog("tempo,Cluster\n1,3\n2,0\n3,3\n4,1\n").unwrap();
        assert_eq!(c.distinct_clusters(), vec![0, 1, 3]);
        assert_eq!(c.cluster(0), Some(3));
        assert_eq!(c.cluster(9), None);
    }

    #[test]
    fn test_value_missing_cell() {
        let c = catalog("tempo,Cluster\n,0\n99.5,1\n").unwrap();
        assert_eq!(c.value(0, AudioFeature::Tempo), None);
        assert_eq!(c.value(1, AudioFeature::Tempo), Some(99.5));
        assert_eq!(c.value(1, AudioFeature::Energy), None);
    }
}
