//! Parsers for `fail2ban-client` output.
//!
//! All parsers are lenient: lines or tokens they don't recognize are skipped,
//! never reported as errors.

use regex::Regex;
use std::sync::LazyLock;

/// Four dot-separated groups of 1-3 digits. The octet range is checked separately.
static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}(\.\d{1,3}){3}$").expect("IPv4 pattern is a valid regex")
});

const JAIL_LIST_MARKER: &str = "Jail list:";

/// Returns true if `token` is a well-formed dotted-quad IPv4 literal.
///
/// Each octet must be 1-3 decimal digits with a value of at most 255.
/// Leading zeros are accepted (`010.0.0.1`), matching what fail2ban prints
/// for some backends.
pub fn is_valid_ipv4(token: &str) -> bool {
    IPV4_PATTERN.is_match(token) && token.split('.').all(|octet| octet.parse::<u8>().is_ok())
}

/// Parses the jail names out of `fail2ban-client status`.
///
/// ```text
/// Status
/// |- Number of jail:      2
/// `- Jail list:   sshd, nginx-http-auth
/// ```
///
/// A server without jails still prints an empty `Jail list:` line, so a
/// missing line returns `None` rather than an empty list.
pub fn parse_jail_list(output: &str) -> Option<Vec<String>> {
    let line = output.lines().find(|line| line.contains(JAIL_LIST_MARKER))?;
    let (_, raw) = line.split_once(JAIL_LIST_MARKER)?;

    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|jail| !jail.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Parses `fail2ban-client get <jail> banip` output into IPv4 hosts.
///
/// Hosts may be separated by spaces or newlines. Tokens that are not
/// well-formed IPv4 literals are dropped.
pub fn parse_banned_hosts(output: &str) -> Vec<String> {
    output
        .split_whitespace()
        .filter(|token| is_valid_ipv4(token))
        .map(str::to_string)
        .collect()
}

/// Extracts the version from `fail2ban-client --version` output.
///
/// `"Fail2Ban v1.0.2\n"` becomes `"1.0.2"`. Returns `None` when the output has
/// no second token.
pub fn parse_version(output: &str) -> Option<String> {
    let token = output.split_whitespace().nth(1)?;
    let version = token.strip_prefix('v').unwrap_or(token);
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}
