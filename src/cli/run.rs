use crate::config::load_config;
use crate::migrate::{MigrateOptions, Migrator};
use crate::sink::MongoDataApiSink;
use crate::source::InfluxSource;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("source error: {0}")]
    Source(#[from] crate::source::SourceError),

    #[error("sink error: {0}")]
    Sink(#[from] crate::sink::SinkError),

    #[error("migration error: {0}")]
    Migrate(#[from] crate::migrate::MigrateError),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/tsferry/config.yml");
            eprintln!("  /etc/tsferry/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'tsferry config init' to generate one.");
            std::process::exit(1);
        }
    };

    run_migration(&config_path).await.map_err(|e| e.into())
}

async fn run_migration(config_path: &PathBuf) -> Result<(), RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;

    info!(url = %config.source.url, database = %config.source.database, "Connecting source store");
    let store = Arc::new(InfluxSource::new(&config.source)?);

    info!(
        database = %config.destination.database,
        collection = %config.destination.collection,
        "Connecting destination store"
    );
    let sink = Arc::new(MongoDataApiSink::new(&config.destination)?);

    let migrator = Migrator::new(store, sink, MigrateOptions::from_config(&config));

    // Ctrl+C flips the shutdown signal; in-flight batch writes complete.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = match migrator.run(shutdown_rx).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Migration run aborted");
            std::process::exit(2);
        }
    };

    // The summary is the machine-readable output; logs are for humans.
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).unwrap_or_default()
    );

    if !summary.fully_succeeded() {
        error!(
            failed = summary.failed_series(),
            attempted = summary.series_attempted(),
            "Migration partially succeeded"
        );
        std::process::exit(1);
    }

    Ok(())
}
