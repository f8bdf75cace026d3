//! fail2ban collaborator.
//!
//! The reconciliation cycle only sees the `BanService` trait; `Fail2banClient`
//! is the production implementation that shells out to `fail2ban-client`.

mod client;
mod command;
mod parse;

use async_trait::async_trait;

use crate::error_handling::CommandError;

// Re-export public API
pub use client::Fail2banClient;
pub use command::{run_command, CommandOutput};
pub use parse::{is_valid_ipv4, parse_banned_hosts, parse_jail_list, parse_version};

/// Source of ban state.
///
/// Host tokens from `list_banned_hosts` are checked with [`is_valid_ipv4`] by
/// the reconciliation cycle before they enter a snapshot.
#[async_trait]
pub trait BanService: Send + Sync {
    /// Whether the ban service is running. Informational only.
    async fn service_running(&self) -> bool;

    /// Names of all configured jails.
    async fn list_jails(&self) -> Result<Vec<String>, CommandError>;

    /// Hosts currently banned in `jail`.
    async fn list_banned_hosts(&self, jail: &str) -> Result<Vec<String>, CommandError>;

    /// Service version, `None` when the probe output is unparseable.
    async fn version(&self) -> Result<Option<String>, CommandError>;
}
