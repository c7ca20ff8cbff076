mod api;
mod bootstrap;
mod health;

use std::future::Future;
use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use spectrum_core::config::{AppConfig, LoadOptions};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use spectrum_core::config::LogFormat::*;

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    let router = Router::new()
        .merge(api::router(api::ApiState::new(app.engine.clone(), &app.config.recommendation)))
        .merge(health::router(app.engine.clone()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind `{address}`"))?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "spectrum-server listening"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    supervise(server, wait_for_shutdown(), stop_tx, grace).await
}

/// Waits for either a shutdown signal or the server exiting on its own, which
/// is always a failure. After a signal the server gets `grace` to drain.
async fn supervise<F>(
    mut server: JoinHandle<io::Result<()>>,
    shutdown: F,
    stop: oneshot::Sender<()>,
    grace: Duration,
) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::select! {
        joined = &mut server => {
            joined.context("server task panicked")?.context("server stopped unexpectedly")?;
            anyhow::bail!("server stopped before a shutdown signal was received");
        }
        signal = shutdown => signal?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = grace.as_secs(),
        "spectrum-server stopping"
    );
    let _ = stop.send(());

    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined.context("server task panicked")??,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            "in-flight requests did not drain before the grace period elapsed"
        ),
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::future::pending;
    use std::io;
    use std::time::Duration;

    use tokio::sync::oneshot;

    use crate::supervise;

    #[tokio::test]
    async fn supervise_reports_server_failure_without_waiting_for_a_signal() {
        let (stop_tx, _stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async {
            Err::<(), _>(io::Error::new(io::ErrorKind::AddrNotAvailable, "listener closed"))
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            supervise(server, pending(), stop_tx, Duration::from_secs(1)),
        )
        .await
        .expect("supervise returns once the server fails");

        let message = format!("{:#}", result.expect_err("server failure is reported"));
        assert!(message.contains("listener closed"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn supervise_stops_server_after_shutdown_signal() {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let _ = stop_rx.await;
            Ok::<(), io::Error>(())
        });

        let result =
            supervise(server, async { Ok(()) }, stop_tx, Duration::from_secs(5)).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn supervise_gives_up_after_grace_period() {
        let (stop_tx, _stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(pending::<io::Result<()>>());

        let result =
            supervise(server, async { Ok(()) }, stop_tx, Duration::from_millis(20)).await;

        assert!(result.is_ok());
    }
}
