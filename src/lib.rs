//! fail2ban_exporter library: fail2ban ban state as Prometheus gauges
//!
//! This library polls fail2ban on a fixed interval, diffs the banned
//! `(jail, host)` pairs against the previous poll, geolocates newly banned
//! hosts through a cached ip-api.com lookup and publishes the result as
//! Prometheus gauges. Released bans stay exported at 0.
//!
//! # Example
//!
//! ```no_run
//! use fail2ban_exporter::{run_exporter, Config};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     port: 9200,
//!     poll_interval: Duration::from_secs(15),
//!     ..Default::default()
//! };
//!
//! // Runs until Ctrl-C or SIGTERM
//! run_exporter(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod config;
pub mod error_handling;
pub mod fail2ban;
pub mod geoip;
pub mod initialization;
pub mod metrics;
pub mod reconcile;
pub mod status_server;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, Opt};
pub use fail2ban::{BanService, Fail2banClient};
pub use geoip::{GeoCache, GeoLookupProvider, GeoResult, IpApiProvider};
pub use metrics::BanMetrics;
pub use reconcile::{BanKey, CycleReport, Reconciler, Snapshot};
pub use run::run_exporter;

// Internal run module (wires the collaborators together)
mod run {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use log::info;
    use tokio_util::sync::CancellationToken;

    use crate::app::{run_scheduler, shutdown_gracefully, wait_for_shutdown_signal};
    use crate::config::Config;
    use crate::error_handling::ExporterStats;
    use crate::fail2ban::Fail2banClient;
    use crate::geoip::{GeoCache, IpApiProvider};
    use crate::initialization::{init_geo_client, init_metrics};
    use crate::reconcile::Reconciler;
    use crate::status_server::{start_status_server, StatusState};

    /// Runs the exporter until a shutdown signal arrives.
    ///
    /// Starts the status server on `config.listen_socket()` and the polling
    /// scheduler. The logger must already be initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics registry or HTTP client cannot be
    /// created, if the listen address cannot be bound, or if the status server
    /// stops on its own.
    pub async fn run_exporter(config: Config) -> Result<()> {
        let stats = Arc::new(ExporterStats::new());
        let metrics = init_metrics().context("Failed to initialize metrics")?;

        let client = init_geo_client(config.geo_timeout)
            .context("Failed to initialize geolocation HTTP client")?;
        let provider = Arc::new(IpApiProvider::new(
            client,
            config.geo_api_url.clone(),
            config.geo_timeout,
        ));
        let geo = Arc::new(
            GeoCache::new(provider)
                .with_lookup_timeout(config.geo_timeout)
                .with_stats(Arc::clone(&stats)),
        );

        let service = Arc::new(Fail2banClient::new(
            config.fail2ban_client.clone(),
            config.command_timeout,
        ));

        let reconciler = Arc::new(Reconciler::new(
            service,
            geo,
            Arc::clone(&metrics),
            Arc::clone(&stats),
        ));

        let cancel = CancellationToken::new();
        let state = StatusState::new(metrics, Arc::clone(&reconciler), stats);
        let mut server_task =
            start_status_server(config.listen_socket(), state, cancel.clone()).await?;

        info!(
            "fail2ban exporter {} started (fail2ban-client: {}, geolocation: {})",
            env!("CARGO_PKG_VERSION"),
            config.fail2ban_client,
            config.geo_api_url
        );

        let scheduler_task = tokio::spawn(run_scheduler(
            reconciler,
            config.poll_interval,
            cancel.clone(),
        ));

        tokio::select! {
            _ = wait_for_shutdown_signal() => {}
            result = &mut server_task => {
                shutdown_gracefully(cancel, Some(scheduler_task), None).await;
                return match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(e).context("Status server task failed"),
                };
            }
        }

        shutdown_gracefully(cancel, Some(scheduler_task), Some(server_task)).await;
        info!("fail2ban exporter stopped");
        Ok(())
    }
}
