use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use harvester_core::{
    load_config, validate_config, HarvestReport, Harvester, HttpPageSource, ItemStore,
    ListingExtractor, PageSource, RecordExtractor, SqliteItemStore,
};
use harvester_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("HARVESTER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Listing source: {}", config.source.base_url);

    // Create SQLite item store
    let store: Arc<dyn ItemStore> = Arc::new(
        SqliteItemStore::new(&config.database.path).context("Failed to create item store")?,
    );
    info!("Item store initialized");

    // Create HTTP page source
    let source: Arc<dyn PageSource> = Arc::new(
        HttpPageSource::new(config.source.clone()).context("Failed to create HTTP client")?,
    );
    let extractor: Arc<dyn RecordExtractor> = Arc::new(ListingExtractor::new());

    let harvester = Harvester::new(source, extractor, store);

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), harvester));

    if config.harvest.run_on_startup {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            info!("Running startup harvest");
            match state.harvester().run(&state.default_params()).await {
                Ok(report) => log_preview(&report, state.config().harvest.preview_count),
                Err(e) => error!("Startup harvest failed: {}", e),
            }
        });
    }

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Log the top `count` ranked records of a run.
fn log_preview(report: &HarvestReport, count: usize) {
    match &report.persist_error {
        None => info!(
            run_id = %report.run_id,
            inserted = report.inserted,
            "Startup harvest persisted"
        ),
        Some(e) => error!(
            run_id = %report.run_id,
            error = %e,
            "Startup harvest not persisted"
        ),
    }

    for (rank, record) in report.top(count).iter().enumerate() {
        info!(
            "#{:<3} {} | score {:.1} | year {} | director {} | weighted {:.2}",
            rank + 1,
            record.title,
            record.score,
            record.year,
            record.director,
            record.weighted_score
        );
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
