use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use path_gtfsrt::clock::{Clock, SystemClock};
use path_gtfsrt::config::{FeedConfig, SourceKind};
use path_gtfsrt::feed::FeedBuilder;
use path_gtfsrt::metrics::FeedMetrics;
use path_gtfsrt::monitor::StatusMonitor;
use path_gtfsrt::source::{PanynjGateway, RazzaGateway, ReqwestFetcher, SourceGateway};
use path_gtfsrt::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = FeedConfig::from_env()?;
    info!(?config, "starting PATH GTFS realtime feed");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let fetcher = Arc::new(ReqwestFetcher::new()?);
    let gateway: Arc<dyn SourceGateway> = match config.source {
        SourceKind::Panynj => Arc::new(
            PanynjGateway::new(fetcher, clock.clone())
                .with_cache_ttl(chrono::Duration::from_std(config.cache_ttl)?),
        ),
        SourceKind::Razza => Arc::new(RazzaGateway::new(fetcher)),
    };

    let monitor = StatusMonitor::spawn(config.history_capacity, config.update_period);
    let metrics = Arc::new(FeedMetrics::new()?);
    let cancel = CancellationToken::new();

    let observer = metrics.clone();
    let builder = FeedBuilder::new(config.clone(), gateway, clock)
        .with_monitor(monitor.clone())
        .with_cancellation(cancel.clone())
        .on_update(move |report| observer.observe(&report.outcome));

    let app = create_router(AppState::new(builder.reader(), monitor, metrics));

    // Nothing is served until the initial cycle has succeeded
    let feed = builder.start().await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            feed.shutdown().await;
            return Err(e.into());
        }
    };
    info!(%addr, "listening");

    let shutdown = cancel.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
    });

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("received ctrl-c, shutting down");
        }
        _ = cancel.cancelled() => {}
    }
    cancel.cancel();
    feed.shutdown().await;
    match server.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "server task failed");
            Ok(())
        }
    }
}
