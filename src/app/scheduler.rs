//! Fixed-interval polling loop.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error_handling::CycleError;
use crate::reconcile::{CycleReport, Reconciler};

/// Runs one reconciliation cycle per tick until `cancel` fires.
///
/// The first cycle starts immediately. A cycle that overruns the interval
/// delays the next tick instead of triggering a burst of catch-up cycles. A
/// running cycle is allowed to finish; cancellation is observed between
/// cycles.
///
/// # Arguments
///
/// * `reconciler` - Owner of the previous snapshot
/// * `interval` - Time between two cycle starts
/// * `cancel` - Shutdown signal
pub async fn run_scheduler(
    reconciler: Arc<Reconciler>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Polling fail2ban every {:?}", interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = reconciler.run_cycle().await;
        log_cycle_result(&result);
    }

    info!("Scheduler stopped");
}

/// Logs the outcome of one cycle.
pub fn log_cycle_result(result: &Result<CycleReport, CycleError>) {
    match result {
        Ok(report) if report.failed_jails.is_empty() => info!(
            "Cycle completed: {} jails, {} newly banned, {} released, {} banned in total",
            report.jails, report.newly_banned, report.released, report.total_banned
        ),
        Ok(report) => warn!(
            "Cycle completed with failed jails [{}]: {} jails, {} newly banned, {} released, {} banned in total",
            report.failed_jails.join(", "),
            report.jails,
            report.newly_banned,
            report.released,
            report.total_banned
        ),
        Err(e) => warn!("Cycle aborted, keeping previous state: {}", e),
    }
}
