//! Reconciliation of fail2ban ban state against the published series.
//!
//! Each cycle collects the current `(jail, host)` pairs, diffs them against the
//! snapshot of the previous cycle and toggles the affected ban series.

mod cycle;
mod snapshot;

// Re-export public API
pub use cycle::{CycleOutcome, CycleRecord, CycleReport, Reconciler};
pub use snapshot::{diff, BanKey, Snapshot, SnapshotDiff};
