//! offline-proxy: offline-first caching proxy.
//!
//! Runs the proxy core as a standalone HTTP service in front of an upstream
//! application origin: versioned cache tiers, per-class consistency
//! strategies, and a control surface for version queries and forced
//! activation.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use offline_proxy::cache::store::{MemoryTierStore, TierStore};
use offline_proxy::cache::tier::VersionTag;
use offline_proxy::config::{Cli, Config};
use offline_proxy::net::http::HttpFetcher;
use offline_proxy::net::Fetcher;
use offline_proxy::proxy::Proxy;
use offline_proxy::server::{build_router, AppState, DetachedClients, LogNotifier};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "offline_proxy=debug,tower_http=debug"
    } else {
        "offline_proxy=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("offline-proxy v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?;
    let config = Arc::new(config);

    info!(
        app = %config.origins.app,
        api = %config.origins.api,
        manifest = config.precache.manifest.len(),
        warmup = config.precache.warmup.len(),
        "Configuration loaded"
    );

    // Build the proxy generation.
    let version = VersionTag::from_startup_time();
    let store: Arc<dyn TierStore> = Arc::new(MemoryTierStore::new());
    let upstream = Arc::new(HttpFetcher::new(Duration::from_secs(
        config.server.request_timeout_secs,
    ))?);

    let proxy = Arc::new(Proxy::new(
        version.clone(),
        config.clone(),
        store,
        upstream.clone() as Arc<dyn Fetcher>,
        Arc::new(DetachedClients),
        Arc::new(LogNotifier),
    )?);

    // Install must fully succeed before this generation takes over; a
    // precache failure aborts startup.
    proxy.install().await?;
    proxy.activate().await;

    // Build application state and the HTTP router.
    let state = Arc::new(AppState {
        proxy,
        upstream,
        config: config.clone(),
    });
    let app = build_router(state);

    // Start the server.
    let listen = cli.listen.unwrap_or_else(|| config.server.listen.clone());
    info!(addr = listen, version = %version, "Starting proxy");

    let listener = TcpListener::bind(&listen).await?;
    info!("Listening on {listen}");

    axum::serve(listener, app).await?;

    Ok(())
}
