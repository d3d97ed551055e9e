//! Cluster Labeler: raw dataset in, labeled dataset out

use crate::kmeans::{KMeans, KMeansConfig};
use std::path::Path;
use tracing::info;
use trackmap_common::config::LabelerConfig;
use trackmap_common::features::{CLUSTER_COLUMN, CLUSTER_FEATURES};
use trackmap_common::{Dataset, Error, MissingValues, Result, StandardScaler};

/// Outcome of one labeling run
#[derive(Debug, Clone)]
pub struct LabelSummary {
    pub rows: usize,
    /// Row count per cluster id
    pub cluster_sizes: Vec<usize>,
    pub inertia: f64,
    pub iterations: usize,
}

/// Assigns every track a k-means cluster over the standardized
/// [`CLUSTER_FEATURES`]
#[derive(Debug, Clone, Default)]
pub struct ClusterLabeler {
    kmeans: KMeans,
}

impl ClusterLabeler {
    pub fn new(config: KMeansConfig) -> Self {
        Self {
            kmeans: KMeans::new(config),
        }
    }

    pub fn from_config(config: &LabelerConfig) -> Self {
        Self::new(KMeansConfig {
            k: config.clusters,
            max_iters: config.max_iters,
            seed: config.seed,
            n_init: config.n_init,
            ..Default::default()
        })
    }

    /// Append (or replace) the `Cluster` column of `dataset`
    ///
    /// Fails before fitting if any required feature column is absent, or if a
    /// required cell is empty or non-numeric.
    pub fn label(&self, dataset: &mut Dataset) -> Result<LabelSummary> {
        let missing: Vec<String> = CLUSTER_FEATURES
            .iter()
            .filter(|f| !dataset.has_column(f.column_name()))
            .map(|f| f.column_name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }

        let columns: Vec<&str> = CLUSTER_FEATURES.iter().map(|f| f.column_name()).collect();
        let x = dataset.feature_matrix(&columns, MissingValues::Reject)?;
        let scaled = StandardScaler::fit_transform(&x)?;

        let model = self.kmeans.fit(&scaled)?;

        let k = self.kmeans.config().k;
        let mut cluster_sizes = vec![0usize; k];
        for &label in model.labels() {
            cluster_sizes[label] += 1;
        }

        let values = model.labels().iter().map(|l| l.to_string()).collect();
        dataset.set_column(CLUSTER_COLUMN, values)?;

        Ok(LabelSummary {
            rows: dataset.len(),
            cluster_sizes,
            inertia: model.inertia(),
            iterations: model.iterations(),
        })
    }

    /// Load `input`, label it and write the result to `output`, replacing any
    /// existing file
    pub fn run(&self, input: &Path, output: &Path) -> Result<LabelSummary> {
        info!("Reading raw dataset: {}", input.display());
        let mut dataset = Dataset::load(input)?;
        info!("Loaded {} tracks", dataset.len());

        let summary = self.label(&mut dataset)?;

        dataset.write(output)?;
        info!("Wrote labeled dataset: {}", output.display());

        Ok(summary)
    }
}
