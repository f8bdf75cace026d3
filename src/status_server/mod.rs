//! HTTP server for Prometheus scrapes and operator checks.
//!
//! Provides two endpoints:
//! - `/metrics` - Prometheus text exposition of the ban gauges
//! - `/status` - JSON status endpoint with cycle outcomes and cache sizes
//!
//! Handlers only read shared state; they never trigger a cycle or a lookup.

mod handlers;
mod types;

use std::net::SocketAddr;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use handlers::{metrics_handler, status_handler};
pub use types::{StatusResponse, StatusState};

/// Builds the router serving `/metrics` and `/status`.
pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

/// Binds `addr` and serves in a background task until `cancel` fires.
///
/// # Errors
///
/// Returns an error if `addr` cannot be bound; errors after that are reported
/// through the returned task handle.
pub async fn start_status_server(
    addr: SocketAddr,
    state: StatusState,
    cancel: CancellationToken,
) -> Result<JoinHandle<Result<(), anyhow::Error>>, anyhow::Error> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind status server to {}", addr))?;

    Ok(tokio::spawn(serve_status(listener, state, cancel)))
}

/// Serves on an already bound listener until `cancel` fires.
pub async fn serve_status(
    listener: TcpListener,
    state: StatusState,
    cancel: CancellationToken,
) -> Result<(), anyhow::Error> {
    let addr = listener.local_addr()?;
    log::info!("Status server listening on http://{}/", addr);
    log::info!("  - Metrics: http://{}/metrics", addr);
    log::info!("  - Status: http://{}/status", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| anyhow::anyhow!("Status server error: {}", e))?;

    log::info!("Status server stopped");
    Ok(())
}
