use crate::HistoryError;
use bastion_audit_types::CheckSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const SCHEMA_HISTORY_INDEX_V1: &str = "bastion-audit.history.v1";

/// One completed check of a source file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub timestamp_ms: i64,
    /// Stored copy, relative to the history directory.
    pub stored_path: String,
    /// File name of the checked source, for listings.
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub summary: CheckSummary,
}

/// Content hash -> snapshots in insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryIndex {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default)]
    pub snapshots: BTreeMap<String, Vec<SnapshotMeta>>,
}

fn default_schema() -> String {
    SCHEMA_HISTORY_INDEX_V1.to_string()
}

impl Default for HistoryIndex {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            snapshots: BTreeMap::new(),
        }
    }
}

impl HistoryIndex {
    pub fn total(&self) -> usize {
        self.snapshots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Append without enforcing retention.
    pub fn push(&mut self, content_hash: &str, meta: SnapshotMeta) {
        self.snapshots
            .entry(content_hash.to_string())
            .or_default()
            .push(meta);
    }

    /// Remove every snapshot for which `drop` returns true, returning the removed ones.
    pub fn remove_where(
        &mut self,
        mut drop: impl FnMut(&str, &SnapshotMeta) -> bool,
    ) -> Vec<(String, SnapshotMeta)> {
        let mut removed = Vec::new();
        for (hash, metas) in self.snapshots.iter_mut() {
            let mut kept = Vec::with_capacity(metas.len());
            for meta in metas.drain(..) {
                if drop(hash, &meta) {
                    removed.push((hash.clone(), meta));
                } else {
                    kept.push(meta);
                }
            }
            *metas = kept;
        }
        self.snapshots.retain(|_, metas| !metas.is_empty());
        removed
    }

    /// Oldest snapshots beyond `max`, ordered oldest first. Ties keep index order.
    pub fn excess_over(&self, max: usize) -> Vec<(String, i64, String)> {
        self.excess_over_keeping(max, |_, _| false)
    }

    /// Like [`HistoryIndex::excess_over`], but snapshots matched by `keep` are never chosen.
    pub fn excess_over_keeping(
        &self,
        max: usize,
        keep: impl Fn(&str, &SnapshotMeta) -> bool,
    ) -> Vec<(String, i64, String)> {
        let total = self.total();
        if total <= max {
            return Vec::new();
        }
        let mut candidates: Vec<(String, i64, String)> = self
            .snapshots
            .iter()
            .flat_map(|(hash, metas)| {
                metas
                    .iter()
                    .filter(|m| !keep(hash, m))
                    .map(|m| (hash.clone(), m.timestamp_ms, m.stored_path.clone()))
            })
            .collect();
        candidates.sort_by_key(|(_, ts, _)| *ts);
        candidates.truncate(total - max);
        candidates
    }
}

/// Addresses one snapshot (`hash@timestamp_ms`) or every snapshot of a file (`hash`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotKey {
    pub content_hash: String,
    pub timestamp_ms: Option<i64>,
}

impl SnapshotKey {
    pub fn new(content_hash: &str, timestamp_ms: i64) -> Self {
        Self {
            content_hash: content_hash.to_string(),
            timestamp_ms: Some(timestamp_ms),
        }
    }

    pub fn matches(&self, content_hash: &str, meta: &SnapshotMeta) -> bool {
        self.content_hash == content_hash
            && self.timestamp_ms.is_none_or(|ts| ts == meta.timestamp_ms)
    }
}

impl FromStr for SnapshotKey {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HistoryError::InvalidKey(s.to_string());
        let (hash, ts) = match s.trim().split_once('@') {
            Some((hash, ts)) => (hash, Some(ts.parse::<i64>().map_err(|_| invalid())?)),
            None => (s.trim(), None),
        };
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        Ok(Self {
            content_hash: hash.to_ascii_lowercase(),
            timestamp_ms: ts,
        })
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp_ms {
            Some(ts) => write!(f, "{}@{ts}", self.content_hash),
            None => f.write_str(&self.content_hash),
        }
    }
}
