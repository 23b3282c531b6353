use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use nnfcm_exporter::config::{AppConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use nnfcm_exporter::control::ScrapeAdmission;
use nnfcm_exporter::router::{create_exporter_router, Exporter};
use nnfcm_exporter::scrape::Scraper;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal exporter error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load(&config_path).context("load configuration")?;
    let bind_addr = config.bind_addr()?;

    let scraper = Scraper::from_config(&config).context("initialize upstream client")?;
    let active = scraper.active_sources();
    if active.is_empty() {
        warn!("no statistics or monitoring source configured; every scrape will answer 400");
    }
    for (kind, source) in &active {
        info!(
            source = %kind,
            endpoint = %source.endpoint(),
            categories = source.categories.len(),
            "upstream source enabled"
        );
    }

    let admission = ScrapeAdmission::new(config.scrape_concurrency());
    let exporter = Arc::new(Exporter::new(scraper, admission));
    let app = create_exporter_router(exporter);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("bind metrics listener {bind_addr}"))?;
    info!(address = %bind_addr, config = %config_path, "serving metrics on /metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("metrics server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl_c listener error");
    }
    info!("Shutdown signal received, exiting");
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
