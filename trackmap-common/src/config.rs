//! Configuration loading and root folder resolution
//!
//! Root folder resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `TRACKMAP_ROOT_FOLDER`
//! 3. TOML config file (`root_folder` key)
//! 4. Compiled default: the current directory
//!
//! A missing TOML file is not an error. The binaries log a warning and run
//! with built-in defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "TRACKMAP_ROOT_FOLDER";

pub const DEFAULT_RAW_DATASET: &str = "spotify_dataset.csv";
pub const DEFAULT_CLUSTERED_DATASET: &str = "spotify_with_clusters.csv";
pub const DEFAULT_PROJECTION_CACHE: &str = "spotify_pca_cache.csv";
pub const DEFAULT_PORT: u16 = 5730;

/// How the projection cache decides whether a stored projection is reusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheKeyPolicy {
    /// Digest of feature names and source row indices
    #[default]
    Fingerprint,
    /// Row count only; equal-size subsets share one cached projection
    RowCount,
}

impl std::str::FromStr for CacheKeyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fingerprint" => Ok(CacheKeyPolicy::Fingerprint),
            "row-count" => Ok(CacheKeyPolicy::RowCount),
            other => Err(Error::Config(format!(
                "unknown cache key policy '{}' (expected fingerprint or row-count)",
                other
            ))),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder that relative file paths resolve against
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Raw dataset read by the labeler
    #[serde(default)]
    pub raw_dataset: Option<PathBuf>,

    /// Labeled dataset written by the labeler and read by the viewer
    #[serde(default)]
    pub clustered_dataset: Option<PathBuf>,

    /// Projection cache file
    #[serde(default)]
    pub projection_cache: Option<PathBuf>,

    /// Viewer HTTP port
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub cache_key: Option<CacheKeyPolicy>,

    #[serde(default)]
    pub labeler: LabelerConfig,
}

/// Clustering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelerConfig {
    #[serde(default = "default_clusters")]
    pub clusters: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_max_iters")]
    pub max_iters: usize,

    /// Number of seeded restarts; the lowest-inertia fit wins
    #[serde(default = "default_n_init")]
    pub n_init: usize,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            clusters: default_clusters(),
            seed: default_seed(),
            max_iters: default_max_iters(),
            n_init: default_n_init(),
        }
    }
}

fn default_clusters() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

fn default_max_iters() -> usize {
    300
}

fn default_n_init() -> usize {
    10
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load the platform config file, falling back to defaults when it is
    /// missing or unreadable
    pub fn load_or_default() -> Self {
        let path = match config_file_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("{}; using built-in defaults", e);
                return Self::default();
            }
        };

        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Resolve the root folder following the four-tier priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml.root_folder {
        return path.clone();
    }

    // Priority 4: compiled default
    PathBuf::from(".")
}

/// Resolve a file path: explicit CLI value, then TOML value, then default
/// name. Relative results are joined onto `root`.
pub fn resolve_file(
    root: &Path,
    cli_arg: Option<&Path>,
    toml_value: Option<&Path>,
    default_name: &str,
) -> PathBuf {
    let chosen = cli_arg
        .or(toml_value)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_name));

    if chosen.is_absolute() {
        chosen
    } else {
        root.join(chosen)
    }
}

/// Get configuration file path for the platform
fn config_file_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("trackmap").join("config.toml"));

    if let Some(path) = &user_config {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/trackmap/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    match user_config {
        Some(path) => Err(Error::Config(format!("Config file not found: {}", path.display()))),
        None => Err(Error::Config("Could not determine config directory".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_policy_parse() {
        assert_eq!("fingerprint".parse::<CacheKeyPolicy>().unwrap(), CacheKeyPolicy::Fingerprint);
        assert_eq!("row-count".parse::<CacheKeyPolicy>().unwrap(), CacheKeyPolicy::RowCount);
        assert!("size".parse::<CacheKeyPolicy>().is_err());
    }

    #[test]
    fn test_resolve_file_relative_joins_root() {
        let root = Path::new("/data");
        let path = resolve_file(root, None, None, DEFAULT_RAW_DATASET);
        assert_eq!(path, PathBuf::from("/data/spotify_dataset.csv"));
    }

    #[test]
    fn test_resolve_file_cli_beats_toml() {
        let root = Path::new("/data");
        let path = resolve_file(
            root,
            Some(Path::new("cli.csv")),
            Some(Path::new("toml.csv")),
            DEFAULT_RAW_DATASET,
        );
        assert_eq!(path, PathBuf::from("/data/cli.csv"));
    }

    #[test]
    fn test_resolve_file_absolute_kept() {
        let root = Path::new("/data");
        let path = resolve_file(root, None, Some(Path::new("/elsewhere/x.csv")), "y.csv");
        assert_eq!(path, PathBuf::from("/elsewhere/x.csv"));
    }
}
