//! shelf-catalog - book ingestion and engagement service
//!
//! Startup order: CLI, config file, tracing, root folder, database, HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shelf_catalog::api::health::SERVICE_NAME;
use shelf_catalog::services::PageScraper;
use shelf_catalog::{build_router, AppState};
use shelf_common::config::{
    default_config_path, load_or_default, ConfigSource, RootFolderInitializer, RootFolderResolver,
    ROOT_FOLDER_ENV,
};
use shelf_common::db::init_database;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for shelf-catalog
#[derive(Parser, Debug)]
#[command(name = "shelf-catalog")]
#[command(about = "Book ingestion and engagement service")]
#[command(version)]
struct Args {
    /// Root folder holding the database
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// TOML config file (defaults to the platform config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address, overriding `server.bind_address`
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The log level lives in the config file, so it is read before tracing is
    // up and reported right after.
    let config_path = args.config.clone().or_else(default_config_path);
    let (config, config_source) = load_or_default(config_path.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting {} v{} [{}] built {} ({})",
        SERVICE_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match config_source {
        ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
        ConfigSource::Fallback(e) => warn!("{}; using defaults", e),
        ConfigSource::Defaults => info!("No config file found, using defaults"),
    }

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder)
        .with_toml(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let scraper =
        PageScraper::http(&config.scraper).context("Failed to build retailer page client")?;
    let state = AppState::new(pool, scraper, &config);
    let app = build_router(state);

    let bind = args.bind.unwrap_or_else(|| config.server.bind_address.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("shelf-catalog listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
