use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod clock;
mod config;
mod error;
mod refresher;
mod snapshot;
mod store;
mod upstream;

use api::AppState;
use clock::{Clock, SystemClock};
use config::Config;
use snapshot::SnapshotStore;
use store::Store;
use upstream::{BallDontLie, BallDontLieConfig, FixtureProvider, GameProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let provider: Arc<dyn GameProvider> = if config.use_fixture {
        info!("Using the built-in fixture slate (no upstream calls)");
        Arc::new(FixtureProvider::new(
            clock.clone(),
            config.default_timezone.clone(),
        ))
    } else {
        Arc::new(BallDontLie::new(
            BallDontLieConfig {
                base_url: config.upstream_api_url.clone(),
                api_key: config.upstream_api_key.clone(),
                default_timezone: config.default_timezone.clone(),
                max_pages: config.max_pages,
            },
            clock.clone(),
        )?)
    };

    let store = Store::new();
    let snapshots = Arc::new(SnapshotStore::new(
        &config.data_dir,
        config.retention_days,
        clock.clone(),
    ));
    info!(
        "Snapshot storage at {} (retention {} days)",
        config.data_dir, config.retention_days
    );

    // Fixture mode also seeds the roster so /api/players has data.
    if config.use_fixture {
        store.replace_players(upstream::fixture::players());
    }

    // First refresh before serving, so the API does not start empty.
    match refresher::refresh_once(provider.as_ref(), &store, &snapshots).await {
        Ok(count) => info!("Initial refresh loaded {} games", count),
        Err(e) => warn!("Initial refresh failed: {}", e),
    }

    refresher::start_refresh_loop(
        provider.clone(),
        store.clone(),
        snapshots.clone(),
        Duration::from_secs(config.refresh_interval_secs),
    );

    let app = api::router(AppState { store, snapshots });
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
