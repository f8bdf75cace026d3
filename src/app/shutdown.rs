//! Graceful shutdown handling.

use tokio_util::sync::CancellationToken;

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl-C, shutting down"),
        _ = terminate => log::info!("Received SIGTERM, shutting down"),
    }
}

/// Shuts down all background tasks gracefully.
///
/// Cancels the shared token, then waits for the scheduler (which finishes its
/// running cycle first) and the status server.
pub async fn shutdown_gracefully(
    cancel: CancellationToken,
    scheduler_task: Option<tokio::task::JoinHandle<()>>,
    server_task: Option<tokio::task::JoinHandle<Result<(), anyhow::Error>>>,
) {
    cancel.cancel();

    if let Some(task) = scheduler_task {
        if let Err(e) = task.await {
            log::warn!("Scheduler task ended abnormally: {}", e);
        }
    }

    if let Some(task) = server_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Status server ended with error: {}", e),
            Err(e) => log::warn!("Status server task ended abnormally: {}", e),
        }
    }
}
