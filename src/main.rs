//! Localization server binary.
//!
//! Loads the trained artifacts, builds the pipeline and shared register,
//! starts the periodic history snapshot task, and serves the HTTP API until
//! ctrl-c.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wifi_locate::api::{self, ApiContext};
use wifi_locate::{AppConfig, LocatePipeline, PositionRegister};

#[derive(Debug, Parser)]
#[command(name = "wifi-locate-server", about = "WiFi RSSI localization server")]
struct Args {
    /// Directory holding runtime.json, scaler.json, and model.json.
    #[arg(long, default_value = "artifacts")]
    config: PathBuf,

    /// Port for the HTTP listener.
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// Destination for the periodic history CSV.
    #[arg(long, default_value = "landmark_history.csv")]
    snapshot_path: PathBuf,

    /// Seconds between history snapshots.
    #[arg(long, default_value_t = 5)]
    snapshot_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = match AppConfig::load(&args.config) {
        Ok(config) => Arc::new(config),
        Err(err) => {
            tracing::error!(dir = %args.config.display(), %err, "configuration rejected");
            std::process::exit(1);
        }
    };
    tracing::info!(
        aps = config.runtime.ap_names.len(),
        labels = config.model.labels.len(),
        top_k = config.runtime.top_k,
        "artifacts loaded"
    );

    let register = Arc::new(PositionRegister::new(
        config.estimator(),
        config.runtime.history_capacity,
    ));
    let pipeline = Arc::new(LocatePipeline::new(
        config.normalizer(),
        config.classifier(),
        config.model.labels.clone(),
        config.runtime.top_k,
        config.runtime.tie_epsilon,
        register.clone(),
    ));

    tokio::spawn(wifi_locate::snapshot::run_snapshot_task(
        register.clone(),
        args.snapshot_path.clone(),
        Duration::from_secs(args.snapshot_interval_secs),
    ));

    let router = api::create_router(ApiContext {
        config,
        register,
        pipeline,
    });

    let addr = format!("0.0.0.0:{}", args.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "cannot listen for ctrl-c");
    }
}
