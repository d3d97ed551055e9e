//! trackmap-pv (Projection Viewer) - interactive track explorer
//!
//! Loads the labeled dataset once and serves a dashboard that filters
//! tracks by cluster and audio-feature ranges, projects the selection to two
//! dimensions and draws it as a scatter chart.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use trackmap_common::config::{
    resolve_file, resolve_root_folder, CacheKeyPolicy, TomlConfig, DEFAULT_CLUSTERED_DATASET,
    DEFAULT_PORT, DEFAULT_PROJECTION_CACHE,
};
use trackmap_pv::{build_router, AppState, ProjectionCache, TrackCatalog};

/// Command-line arguments for trackmap-pv
#[derive(Parser, Debug)]
#[command(name = "trackmap-pv")]
#[command(about = "Explore clustered tracks on a 2-D projection")]
#[command(version)]
struct Args {
    /// Folder that relative paths resolve against
    #[arg(short, long, env = "TRACKMAP_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Labeled dataset CSV (output of trackmap-cl)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Projection cache CSV
    #[arg(short, long)]
    cache: Option<PathBuf>,

    /// HTTP port
    #[arg(short, long, env = "TRACKMAP_PV_PORT")]
    port: Option<u16>,

    /// Cache key policy: fingerprint or row-count
    #[arg(long)]
    cache_key: Option<CacheKeyPolicy>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting trackmap Projection Viewer (trackmap-pv) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let toml = TomlConfig::load_or_default();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml);
    let dataset_path = resolve_file(
        &root_folder,
        args.dataset.as_deref(),
        toml.clustered_dataset.as_deref(),
        DEFAULT_CLUSTERED_DATASET,
    );
    let cache_path = resolve_file(
        &root_folder,
        args.cache.as_deref(),
        toml.projection_cache.as_deref(),
        DEFAULT_PROJECTION_CACHE,
    );
    let policy = args.cache_key.or(toml.cache_key).unwrap_or_default();
    let port = args.port.or(toml.port).unwrap_or(DEFAULT_PORT);

    info!("Dataset: {}", dataset_path.display());
    info!("Projection cache: {} (key: {:?})", cache_path.display(), policy);

    let catalog = match TrackCatalog::load(&dataset_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("{}", e);
            return Err(e)
                .with_context(|| format!("Failed to load {}", dataset_path.display()));
        }
    };

    let state = AppState::new(catalog, ProjectionCache::new(cache_path, policy));
    let app = build_router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("trackmap-pv listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
