//! Main application modules.
//!
//! This module provides the polling scheduler and shutdown handling used by
//! `run_exporter`.

pub mod scheduler;
pub mod shutdown;

// Re-export public API
pub use scheduler::run_scheduler;
pub use shutdown::{shutdown_gracefully, wait_for_shutdown_signal};
