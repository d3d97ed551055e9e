//! trackmap-cl (Cluster Labeler) - batch labeling job
//!
//! Reads the raw track dataset, fits k-means over the standardized audio
//! features and writes the dataset back out with an integer `Cluster` column.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use trackmap_cl::ClusterLabeler;
use trackmap_common::config::{
    resolve_file, resolve_root_folder, TomlConfig, DEFAULT_CLUSTERED_DATASET, DEFAULT_RAW_DATASET,
};

/// Command-line arguments for trackmap-cl
#[derive(Parser, Debug)]
#[command(name = "trackmap-cl")]
#[command(about = "Label tracks with k-means clusters over their audio features")]
#[command(version)]
struct Args {
    /// Folder that relative paths resolve against
    #[arg(short, long, env = "TRACKMAP_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Raw dataset CSV
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Labeled dataset CSV (overwritten)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of clusters
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    /// Random seed for centroid initialisation
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting trackmap Cluster Labeler (trackmap-cl) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let toml = TomlConfig::load_or_default();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml);
    let input = resolve_file(
        &root_folder,
        args.input.as_deref(),
        toml.raw_dataset.as_deref(),
        DEFAULT_RAW_DATASET,
    );
    let output = resolve_file(
        &root_folder,
        args.output.as_deref(),
        toml.clustered_dataset.as_deref(),
        DEFAULT_CLUSTERED_DATASET,
    );

    let mut labeler_config = toml.labeler.clone();
    if let Some(k) = args.clusters {
        labeler_config.clusters = k;
    }
    if let Some(seed) = args.seed {
        labeler_config.seed = seed;
    }
    info!(
        "k = {}, seed = {}, restarts = {}",
        labeler_config.clusters, labeler_config.seed, labeler_config.n_init
    );

    let labeler = ClusterLabeler::from_config(&labeler_config);
    let summary = match labeler.run(&input, &output) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Labeling failed: {}", e);
            return Err(e).with_context(|| format!("Failed to label {}", input.display()));
        }
    };

    for (cluster, size) in summary.cluster_sizes.iter().enumerate() {
        info!("  cluster {}: {} tracks", cluster, size);
    }
    info!(
        "✓ {} created ({} tracks, inertia {:.3}, {} iterations)",
        output.display(),
        summary.rows,
        summary.inertia,
        summary.iterations
    );

    Ok(())
}
