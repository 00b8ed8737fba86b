use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::rest::{self, AppState};
use crate::config::Config;
use crate::domain::gateway::HttpGateway;
use crate::domain::rate_limiter::RateLimiter;
use crate::domain::runner::ProcessRunner;

pub fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();
}

pub async fn run(config: Config) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "OpenClaw dashboard starting");

    let gateway = HttpGateway::new(
        &config.openclaw.gateway_url,
        config.openclaw.gateway_token.clone(),
    )
    .context("building gateway client")?;

    let state = AppState::new(&config, Arc::new(ProcessRunner), Arc::new(gateway));
    let sweeper = spawn_sweeper(
        state.limiter.clone(),
        Duration::from_secs(config.rate_limit.sweep_interval_secs.max(1)),
    );

    let auth_enabled = state.auth.is_enabled();
    let app = rest::router(state).layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;

    info!(
        addr = %addr,
        gateway_url = %config.openclaw.gateway_url,
        auth_enabled,
        services = config.services.len(),
        hosts = config.hosts.len(),
        "HTTP server listening"
    );

    let stop = Arc::new(Notify::new());
    let mut server = {
        let stop = stop.clone();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { stop.notified().await })
            .await
        })
    };

    tokio::select! {
        res = &mut server => {
            sweeper.abort();
            res.context("HTTP server task panicked")?
                .context("HTTP server error")?;
            info!("OpenClaw dashboard stopped");
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    // Stop accepting; in-flight requests get until the grace period ends.
    stop.notify_one();
    let grace = Duration::from_secs(config.shutdown_grace_secs);
    let outcome = tokio::time::timeout(grace, &mut server).await;
    sweeper.abort();

    match outcome {
        Ok(res) => {
            res.context("HTTP server task panicked")?
                .context("HTTP server error")?;
            info!("OpenClaw dashboard stopped");
            Ok(())
        }
        Err(_) => {
            warn!(
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out, forcing exit"
            );
            std::process::exit(1);
        }
    }
}

/// Periodically drop idle rate-limit windows. Aborted on shutdown.
fn spawn_sweeper(limiter: Arc<RateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // First tick fires immediately; nothing to sweep yet.
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                info!(
                    removed,
                    tracked = limiter.tracked_clients(),
                    "swept idle rate-limit windows"
                );
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("Received Ctrl+C, shutting down"); },
        _ = terminate => { info!("Received SIGTERM, shutting down"); },
    }
}
