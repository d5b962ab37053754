//! Data citation server.
//!
//! Runs the HTTP API, the Prometheus scrape endpoint and the request sweeper
//! until Ctrl+C or SIGTERM, then drains in-flight resolutions.
//!
//! # Usage
//!
//! ```bash
//! CITATION_USERS=alice:secret cargo run --bin data-citation-server
//! ```

use anyhow::Context;
use axum::{Router, routing::get};
use data_citation_runtime::metrics::MetricsServer;
use data_citation_server::{CitationApp, Config};
use std::net::{IpAddr, SocketAddr};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,data_citation=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting data citation server");

    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        registry = %config.resolver.base_url,
        max_retries = config.resolver.max_retries,
        max_concurrent_resolutions = config.resolver.max_concurrent_resolutions,
        "Configuration loaded"
    );

    let metrics_ip: IpAddr = config
        .server
        .host
        .parse()
        .context("HOST must be an IP address")?;
    let metrics_addr = SocketAddr::new(metrics_ip, config.server.metrics_port);
    let mut metrics = MetricsServer::new(metrics_addr);
    metrics.start().context("failed to install metrics recorder")?;
    spawn_metrics_endpoint(metrics).await?;

    let app = CitationApp::new(&config)?;
    let processor = app.processor.clone();
    let router = app.router();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = app.sweeper.spawn(shutdown_rx);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped, draining resolutions");
    let _ = shutdown_tx.send(true);

    if let Err(e) = processor.shutdown(config.shutdown_timeout()).await {
        warn!(error = %e, "Resolutions abandoned at shutdown");
    }
    if let Err(e) = sweeper.await {
        error!(error = %e, "Sweeper task failed");
    }

    info!("Server stopped");
    Ok(())
}

/// Serve `GET /metrics` on the metrics port.
async fn spawn_metrics_endpoint(metrics: MetricsServer) -> anyhow::Result<()> {
    let addr = metrics.addr();
    let Some(handle) = metrics.handle().cloned() else {
        warn!("Metrics recorder owned elsewhere, scrape endpoint disabled");
        return Ok(());
    };

    let router = Router::new().route("/metrics", get(move || std::future::ready(handle.render())));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics port {addr}"))?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "Metrics endpoint failed");
        }
    });

    info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal, shutting down gracefully..."),
        () = terminate => info!("Received SIGTERM signal, shutting down gracefully..."),
    }
}
