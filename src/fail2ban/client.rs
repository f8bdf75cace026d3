//! `BanService` backed by the fail2ban command-line tools.

use std::time::Duration;

use async_trait::async_trait;

use super::command::run_command;
use super::parse::{parse_banned_hosts, parse_jail_list, parse_version};
use super::BanService;
use crate::config::{FAIL2BAN_SERVER_PROCESS, FAIL2BAN_SERVICE_UNIT};
use crate::error_handling::CommandError;

/// Talks to a local fail2ban server through `fail2ban-client`.
///
/// The liveness probe additionally uses `systemctl` and `pgrep`.
#[derive(Debug, Clone)]
pub struct Fail2banClient {
    client_binary: String,
    timeout: Duration,
}

impl Fail2banClient {
    /// Creates a client for the given `fail2ban-client` binary.
    pub fn new(client_binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client_binary: client_binary.into(),
            timeout,
        }
    }

    async fn fail2ban(&self, args: &[&str]) -> Result<String, CommandError> {
        run_command(&self.client_binary, args, self.timeout)
            .await
            .map(|output| output.stdout)
    }
}

#[async_trait]
impl BanService for Fail2banClient {
    async fn service_running(&self) -> bool {
        // systemd first, pgrep covers non-systemd hosts and containers
        if let Ok(output) = run_command(
            "systemctl",
            &["is-active", FAIL2BAN_SERVICE_UNIT],
            self.timeout,
        )
        .await
        {
            if output.stdout.trim() == "active" {
                return true;
            }
        }

        match run_command("pgrep", &["-x", FAIL2BAN_SERVER_PROCESS], self.timeout).await {
            Ok(output) => !output.stdout.trim().is_empty(),
            Err(e) => {
                log::debug!("fail2ban-server not found by pgrep: {}", e);
                false
            }
        }
    }

    async fn list_jails(&self) -> Result<Vec<String>, CommandError> {
        let output = self.fail2ban(&["status"]).await?;
        parse_jail_list(&output).ok_or_else(|| CommandError::UnexpectedOutput {
            command: format!("{} status", self.client_binary),
            output: output.trim().chars().take(200).collect(),
        })
    }

    async fn list_banned_hosts(&self, jail: &str) -> Result<Vec<String>, CommandError> {
        let output = self.fail2ban(&["get", jail, "banip"]).await?;
        Ok(parse_banned_hosts(&output))
    }

    async fn version(&self) -> Result<Option<String>, CommandError> {
        let output = self.fail2ban(&["--version"]).await?;
        Ok(parse_version(&output))
    }
}
