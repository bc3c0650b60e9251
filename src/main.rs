use std::{future::IntoFuture, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kfk_monitor::{
    client::ClientBuilder,
    config::Config,
    http::{AppState, build_router},
    monitor::Monitor,
    pipeline::RefreshOptions,
    publisher::SnapshotPublisher,
    sink::MongoSink,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    info!(
        brokers = ?config.brokers,
        interval = ?config.tick_interval(),
        persistence = config.mongo_uri().is_some(),
        "Starting"
    );

    let client = ClientBuilder::new(config.brokers.clone())
        .client_id(config.client_id.as_str())
        .connect_timeout(config.connect_timeout())
        .request_timeout(config.request_timeout())
        .build()
        .await
        .context("cannot connect to the cluster")?;

    let publisher = Arc::new(SnapshotPublisher::default());
    let options = RefreshOptions {
        fetch_concurrency: config.fetch_concurrency,
    };
    let mut monitor = Monitor::<_, MongoSink>::new(client, Arc::clone(&publisher), options);
    if let Some(uri) = config.mongo_uri() {
        let sink = MongoSink::connect(uri, &config.mongo_database)
            .await
            .context("cannot set up MongoDB sink")?;
        monitor = monitor.with_sink(sink);
    }

    // serve a snapshot from the first request on
    match monitor.tick().await {
        Ok(_) => {}
        Err(e) if e.is_fatal() => return Err(e).context("initial refresh failed"),
        Err(e) => warn!(%e, "Initial refresh failed"),
    }

    let app = build_router(Arc::new(AppState {
        publisher,
        stale_after: config.stale_after(),
    }));
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("cannot listen on {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Serving metrics");

    tokio::select! {
        res = axum::serve(listener, app).into_future() => res.context("HTTP server failed")?,
        res = monitor.run(config.tick_interval()) => res.context("refresh loop stopped")?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
