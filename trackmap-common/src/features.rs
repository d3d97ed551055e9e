//! Audio feature catalogue
//!
//! Column names are matched by exact string against the dataset header.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric audio feature columns known to trackmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFeature {
    Danceability,
    Energy,
    Loudness,
    Speechiness,
    Acousticness,
    Instrumentalness,
    Liveness,
    Valence,
    Tempo,
    DurationMs,
    Popularity,
}

/// Features the Cluster Labeler requires, in matrix column order
pub const CLUSTER_FEATURES: [AudioFeature; 9] = [
    AudioFeature::Danceability,
    AudioFeature::Energy,
    AudioFeature::Loudness,
    AudioFeature::Speechiness,
    AudioFeature::Acousticness,
    AudioFeature::Instrumentalness,
    AudioFeature::Liveness,
    AudioFeature::Valence,
    AudioFeature::Tempo,
];

/// Candidate features for the projection; only those present are used
pub const PROJECTION_CANDIDATES: [AudioFeature; 11] = [
    AudioFeature::Danceability,
    AudioFeature::Energy,
    AudioFeature::Loudness,
    AudioFeature::Speechiness,
    AudioFeature::Acousticness,
    AudioFeature::Instrumentalness,
    AudioFeature::Liveness,
    AudioFeature::Valence,
    AudioFeature::Tempo,
    AudioFeature::DurationMs,
    AudioFeature::Popularity,
];

/// Features shown in scatter hover text when present
pub const HOVER_FEATURES: [AudioFeature; 5] = [
    AudioFeature::Tempo,
    AudioFeature::Energy,
    AudioFeature::Danceability,
    AudioFeature::Valence,
    AudioFeature::Popularity,
];

/// Candidate column names for the track display name, in priority order
pub const TRACK_NAME_COLUMNS: [&str; 4] = ["track_name", "track", "name", "title"];

/// Candidate column names for the artist, in priority order
pub const ARTIST_NAME_COLUMNS: [&str; 3] = ["artist_name", "artists", "artist"];

/// Name of the integer cluster id column written by the labeler
pub const CLUSTER_COLUMN: &str = "Cluster";

impl AudioFeature {
    /// CSV column name for this feature
    pub fn column_name(self) -> &'static str {
        match self {
            AudioFeature::Danceability => "danceability",
            AudioFeature::Energy => "energy",
            AudioFeature::Loudness => "loudness",
            AudioFeature::Speechiness => "speechiness",
            AudioFeature::Acousticness => "acousticness",
            AudioFeature::Instrumentalness => "instrumentalness",
            AudioFeature::Liveness => "liveness",
            AudioFeature::Valence => "valence",
            AudioFeature::Tempo => "tempo",
            AudioFeature::DurationMs => "duration_ms",
            AudioFeature::Popularity => "popularity",
        }
    }

    /// Look up a feature by CSV column name
    pub fn from_column_name(name: &str) -> Option<Self> {
        PROJECTION_CANDIDATES
            .iter()
            .copied()
            .find(|f| f.column_name() == name)
    }
}

impl fmt::Display for AudioFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}
