use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod chart;
mod config;
mod controller;
mod handlers;
mod metrics;
mod middleware;
mod server;

use config::Config;
use controller::{Controller, HttpEndpoint};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Selection, run status and samples. Runs are spawned against a clone.
    pub controller: Arc<Controller>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edge_latency_bench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║   🌐  GLOBAL ↔ REGIONAL EDGE LATENCY BENCH       ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    // ── 1. Measurement endpoints ─────────────────────────────────
    let endpoint = HttpEndpoint::new(&config.target, config.request_timeout())
        .context("failed to build HTTP client")?;
    info!(
        target_url = %config.target,
        timeout_ms = ?config.request_timeout_ms,
        "measuring against target"
    );

    // ── 2. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState {
        controller: Arc::new(Controller::new(Arc::new(endpoint))),
    });

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state, &config.static_dir);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    info!(addr = %config.listen, "dashboard → http://{}", config.listen);
    info!("run stream → http://{}/api/run/stream", config.listen);

    axum::serve(listener, app).await.context("server exited with error")?;
    Ok(())
}
