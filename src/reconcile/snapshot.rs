//! Ban snapshots and the differ between two of them.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Identity of one banned host in one jail.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BanKey {
    pub jail: String,
    pub host: String,
}

impl BanKey {
    pub fn new(jail: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            jail: jail.into(),
            host: host.into(),
        }
    }
}

impl fmt::Display for BanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.jail, self.host)
    }
}

/// The set of `(jail, host)` pairs considered banned after a cycle.
///
/// Ordered so iteration (and therefore publishing and logging) is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    keys: BTreeSet<BanKey>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key. Returns false if it was already present.
    pub fn insert(&mut self, key: BanKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &BanKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BanKey> {
        self.keys.iter()
    }

    /// Keys belonging to `jail`.
    pub fn keys_in_jail<'a>(&'a self, jail: &'a str) -> impl Iterator<Item = &'a BanKey> + 'a {
        self.keys.iter().filter(move |key| key.jail == jail)
    }
}

impl FromIterator<BanKey> for Snapshot {
    fn from_iter<I: IntoIterator<Item = BanKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl Extend<BanKey> for Snapshot {
    fn extend<I: IntoIterator<Item = BanKey>>(&mut self, iter: I) {
        self.keys.extend(iter);
    }
}

/// Keys that appeared and disappeared between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// In the current snapshot but not the previous one.
    pub newly_banned: BTreeSet<BanKey>,
    /// In the previous snapshot but not the current one.
    pub released: BTreeSet<BanKey>,
}

impl SnapshotDiff {
    /// True when both snapshots held the same keys.
    pub fn is_empty(&self) -> bool {
        self.newly_banned.is_empty() && self.released.is_empty()
    }
}

/// Computes `current - previous` and `previous - current`.
///
/// The caller must only pass a `current` built from a successful collection:
/// an empty `current` releases every previous key.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> SnapshotDiff {
    SnapshotDiff {
        newly_banned: current.keys.difference(&previous.keys).cloned().collect(),
        released: previous.keys.difference(&current.keys).cloned().collect(),
    }
}
