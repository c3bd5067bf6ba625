//! meterd-api - utility-meter reading service
//!
//! HTTP service recording water and gas meter readings from photos, with
//! Gemini-backed value extraction and one-time human confirmation.

use anyhow::Result;
use clap::Parser;
use meterd_api::engine::MeasurementEngine;
use meterd_api::extraction::GeminiExtractor;
use meterd_api::query::QueryService;
use meterd_api::store::MeasurementStore;
use meterd_api::{build_router, AppState};
use meterd_common::config::MeterdConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Utility-meter reading service
#[derive(Debug, Parser)]
#[command(name = "meterd-api", version)]
struct Args {
    /// Listen address, e.g. 127.0.0.1:5850
    #[arg(long)]
    bind: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting meterd-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = MeterdConfig::load(args.bind.as_deref(), args.config.as_deref())?;

    if config.gemini_api_key.is_none() {
        info!("GEMINI_API_KEY not configured; uploads will fail until one is set");
    }

    let store = Arc::new(MeasurementStore::new());
    let extractor = Arc::new(GeminiExtractor::new(&config)?);
    let engine = MeasurementEngine::new(store.clone(), extractor);
    let query = QueryService::new(store);

    let state = AppState::new(engine, query, &config.image_base_url);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("meterd-api listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
