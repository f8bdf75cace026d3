//! `Fail2banClient` driven through the reconciliation cycle with a scripted
//! `fail2ban-client` stand-in.

#![cfg(unix)]

mod helpers;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fail2ban_exporter::error_handling::{CommandError, CycleError, ExporterStats};
use fail2ban_exporter::{BanKey, BanMetrics, Fail2banClient, GeoCache, Reconciler};

use helpers::FakeGeoProvider;

const SCRIPT: &str = r#"#!/bin/sh
mode=$(cat "$(dirname "$0")/mode")
case "$1" in
  status)
    if [ "$mode" = "ok" ]; then
      printf 'Status\n|- Number of jail:\t1\n`- Jail list:\tsshd\n'
    else
      echo "Unexpected output from server"
    fi
    ;;
  get) echo "1.2.3.4 not-an-ip 999.1.1.1" ;;
  --version) echo "Fail2Ban v1.0.2" ;;
esac
"#;

/// Writes the scripted client into a fresh directory and returns its path.
fn scripted_client(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "fail2ban-exporter-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create script directory");

    let script = dir.join("fail2ban-client");
    fs::write(&script, SCRIPT).expect("Failed to write script");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
    set_mode(&script, "ok");
    script
}

fn set_mode(script: &Path, mode: &str) {
    let dir = script.parent().expect("script has a parent directory");
    fs::write(dir.join("mode"), mode).expect("Failed to write mode file");
}

#[tokio::test]
async fn test_status_without_jail_list_aborts_instead_of_releasing() {
    let script = scripted_client("status-output");
    let client = Fail2banClient::new(script.to_string_lossy(), Duration::from_secs(5));
    let metrics = Arc::new(BanMetrics::new().unwrap());
    let stats = Arc::new(ExporterStats::new());
    let reconciler = Reconciler::new(
        Arc::new(client),
        Arc::new(GeoCache::new(Arc::new(FakeGeoProvider::new()))),
        Arc::clone(&metrics),
        stats,
    );
    let key = BanKey::new("sshd", "1.2.3.4");

    let report = reconciler.run_cycle().await.unwrap();
    assert_eq!(report.jails, 1);
    // Malformed tokens never reach the snapshot
    assert_eq!(report.newly_banned, 1);
    assert_eq!(metrics.ban_status(&key), Some(1.0));

    set_mode(&script, "broken");
    let err = reconciler.run_cycle().await.unwrap_err();

    assert!(matches!(
        err,
        CycleError::JailListUnavailable(CommandError::UnexpectedOutput { .. })
    ));
    assert_eq!(reconciler.snapshot_len(), 1);
    assert_eq!(metrics.ban_status(&key), Some(1.0));
    assert_eq!(metrics.total_banned(), 1.0);

    let _ = fs::remove_dir_all(script.parent().unwrap());
}
