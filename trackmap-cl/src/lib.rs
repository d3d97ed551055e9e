//! trackmap-cl library - Cluster Labeler
//!
//! Standardizes the audio feature columns of a raw track dataset, fits a
//! fixed-k k-means model and writes the dataset back out with an integer
//! `Cluster` column.

pub mod kmeans;
pub mod labeler;

pub use kmeans::{KMeans, KMeansConfig, KMeansModel};
pub use labeler::{ClusterLabeler, LabelSummary};
