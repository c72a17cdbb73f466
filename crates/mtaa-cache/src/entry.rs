//! Cache entries and statistics.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached value with its expiry metadata.
///
/// This is also the on-disk layout of a [`crate::DiskCacheStore`] entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The key for this entry.
    pub key: String,

    /// The cached payload.
    pub value: serde_json::Value,

    /// When the entry was written.
    pub created_at: DateTime<Utc>,

    /// Time-to-live in milliseconds.
    pub ttl_ms: u64,
}

impl CacheEntry {
    /// Create an entry written at `created_at`.
    pub fn new(
        key: impl Into<String>,
        value: serde_json::Value,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            created_at,
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// The entry's TTL.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Moment the entry stops being valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = chrono::Duration::milliseconds(i64::try_from(self.ttl_ms).unwrap_or(i64::MAX));
        self.created_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// An entry is valid iff `now < created_at + ttl`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    /// Summary used by [`CacheStats`].
    pub fn info_at(&self, now: DateTime<Utc>) -> EntryInfo {
        EntryInfo {
            key: self.key.clone(),
            age_secs: (now - self.created_at).num_seconds(),
            remaining_ttl_secs: (self.expires_at() - now).num_seconds(),
            expired: !self.is_valid_at(now),
        }
    }
}

/// Per-entry summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub key: String,
    pub age_secs: i64,
    pub remaining_ttl_secs: i64,
    pub expired: bool,
}

/// Snapshot of the cache contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Readable entries, expired or not.
    pub total_entries: usize,

    /// Entries past their TTL that still occupy storage.
    pub expired_entries: usize,

    /// Entries that could not be read back.
    pub corrupted_entries: usize,

    /// Details, sorted by key.
    pub entries: Vec<EntryInfo>,
}

impl CacheStats {
    /// Build stats from readable entries plus a count of unreadable ones.
    pub fn collect<'a>(
        entries: impl IntoIterator<Item = &'a CacheEntry>,
        corrupted_entries: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let mut infos: Vec<EntryInfo> = entries.into_iter().map(|e| e.info_at(now)).collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));

        Self {
            total_entries: infos.len(),
            expired_entries: infos.iter().filter(|i| i.expired).count(),
            corrupted_entries,
            entries: infos,
        }
    }
}
