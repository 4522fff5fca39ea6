use crate::clock::DAY_MS;
use crate::index::{HistoryIndex, SnapshotKey, SnapshotMeta};
use crate::{HistoryError, content_hash};
use anyhow::Context;
use bastion_audit_types::CheckSummary;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::io::ErrorKind;

pub const INDEX_FILE: &str = "index.json";
pub const SNAPSHOTS_DIR: &str = "snapshots";

/// Slack allowed around the comparison target: a tenth of the window, at least one day.
pub fn tolerance_days(window_days: u32) -> u32 {
    (window_days / 10).max(1)
}

/// A snapshot resolved against the history directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub content_hash: String,
    pub meta: SnapshotMeta,
    /// Absolute location of the stored copy.
    pub path: Utf8PathBuf,
}

impl Snapshot {
    pub fn key(&self) -> SnapshotKey {
        SnapshotKey::new(&self.content_hash, self.meta.timestamp_ms)
    }
}

/// One row of `history list`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub key: String,
    pub content_hash: String,
    pub timestamp_ms: i64,
    pub source_name: String,
    pub stored_path: String,
    pub exists: bool,
    pub summary: CheckSummary,
}

/// The history directory: `index.json` plus stored copies under `snapshots/`.
#[derive(Debug)]
pub struct HistoryStore {
    dir: Utf8PathBuf,
    index: HistoryIndex,
}

impl HistoryStore {
    /// Load the index (empty if absent or corrupt) and drop entries whose copy is gone.
    pub fn open(dir: &Utf8Path) -> anyhow::Result<Self> {
        let index = load_index(&dir.join(INDEX_FILE))?;
        let mut store = Self {
            dir: dir.to_path_buf(),
            index,
        };
        store.prune_missing()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn index(&self) -> &HistoryIndex {
        &self.index
    }

    fn resolve(&self, stored_path: &str) -> Utf8PathBuf {
        self.dir.join(stored_path)
    }

    fn stored_exists(&self, stored_path: &str) -> bool {
        self.resolve(stored_path).is_file()
    }

    /// The snapshot of `hash` taken closest to `now - window_days`, within tolerance.
    ///
    /// Ties go to the earlier entry in index order. Snapshots whose stored copy is missing
    /// are skipped.
    pub fn find_snapshot_near(&self, hash: &str, now_ms: i64, window_days: u32) -> Option<Snapshot> {
        let target = now_ms.saturating_sub(i64::from(window_days) * DAY_MS);
        let tolerance = u64::from(tolerance_days(window_days)) * DAY_MS.unsigned_abs();

        let mut best: Option<(u64, &SnapshotMeta)> = None;
        for meta in self.index.snapshots.get(hash)? {
            let delta = meta.timestamp_ms.abs_diff(target);
            if delta > tolerance || !self.stored_exists(&meta.stored_path) {
                continue;
            }
            if best.is_none_or(|(d, _)| delta < d) {
                best = Some((delta, meta));
            }
        }

        best.map(|(_, meta)| Snapshot {
            content_hash: hash.to_string(),
            meta: meta.clone(),
            path: self.resolve(&meta.stored_path),
        })
    }

    /// Append to the index. Retention is not enforced and nothing is saved.
    pub fn record_snapshot(
        &mut self,
        hash: &str,
        timestamp_ms: i64,
        stored_path: &str,
        source_name: &str,
        summary: CheckSummary,
    ) {
        self.index.push(
            hash,
            SnapshotMeta {
                timestamp_ms,
                stored_path: stored_path.to_string(),
                source_name: source_name.to_string(),
                summary,
            },
        );
    }

    /// Evict the globally oldest snapshots until at most `max` remain, deleting their copies.
    pub fn enforce_retention(&mut self, max: usize) -> Vec<SnapshotKey> {
        self.evict_over(max, |_, _| false)
    }

    fn evict_over(
        &mut self,
        max: usize,
        keep: impl Fn(&str, &SnapshotMeta) -> bool,
    ) -> Vec<SnapshotKey> {
        let excess = self.index.excess_over_keeping(max, keep);
        if excess.is_empty() {
            return Vec::new();
        }

        let removed = self.index.remove_where(|hash, meta| {
            excess
                .iter()
                .any(|(h, ts, path)| h == hash && *ts == meta.timestamp_ms && *path == meta.stored_path)
        });

        let mut evicted = Vec::with_capacity(removed.len());
        for (hash, meta) in removed {
            self.remove_stored(&meta.stored_path);
            let key = SnapshotKey::new(&hash, meta.timestamp_ms);
            tracing::warn!(%key, max, "evicted snapshot over retention cap");
            evicted.push(key);
        }
        evicted
    }

    /// Drop index entries whose stored copy no longer exists, saving if anything changed.
    pub fn prune_missing(&mut self) -> anyhow::Result<usize> {
        let dir = self.dir.clone();
        let removed = self
            .index
            .remove_where(|_, meta| !dir.join(&meta.stored_path).is_file());
        for (hash, meta) in &removed {
            tracing::warn!(
                key = %SnapshotKey::new(hash, meta.timestamp_ms),
                stored_path = %meta.stored_path,
                "pruned history entry with missing stored copy"
            );
        }
        if !removed.is_empty() {
            self.save()?;
        }
        Ok(removed.len())
    }

    /// Store a copy of the checked bytes, record the snapshot, evict, and save.
    ///
    /// The snapshot being committed is never evicted, even when an earlier clock reading makes
    /// it the oldest entry; older snapshots go instead.
    pub fn commit_snapshot(
        &mut self,
        source_name: &str,
        bytes: &[u8],
        timestamp_ms: i64,
        summary: CheckSummary,
        retention_max: usize,
    ) -> anyhow::Result<Snapshot> {
        let hash = content_hash(bytes);
        let extension = Utf8Path::new(source_name).extension().unwrap_or("bin");
        let stored_path = format!("{SNAPSHOTS_DIR}/{hash}-{timestamp_ms}.{extension}");
        let path = self.resolve(&stored_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        std::fs::write(&path, bytes).with_context(|| format!("write snapshot copy {path}"))?;

        let already_indexed = self
            .index
            .snapshots
            .get(&hash)
            .is_some_and(|metas| metas.iter().any(|m| m.stored_path == stored_path));
        if !already_indexed {
            self.record_snapshot(&hash, timestamp_ms, &stored_path, source_name, summary.clone());
        }
        self.evict_over(retention_max, |h, meta| h == hash && meta.stored_path == stored_path);
        self.save()?;

        tracing::info!(
            key = %SnapshotKey::new(&hash, timestamp_ms),
            total = self.index.total(),
            "recorded snapshot"
        );

        Ok(Snapshot {
            content_hash: hash,
            meta: SnapshotMeta {
                timestamp_ms,
                stored_path,
                source_name: source_name.to_string(),
                summary,
            },
            path,
        })
    }

    /// All snapshots, newest first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        let mut entries: Vec<HistoryEntry> = self
            .index
            .snapshots
            .iter()
            .flat_map(|(hash, metas)| {
                metas.iter().map(move |meta| HistoryEntry {
                    key: SnapshotKey::new(hash, meta.timestamp_ms).to_string(),
                    content_hash: hash.clone(),
                    timestamp_ms: meta.timestamp_ms,
                    source_name: meta.source_name.clone(),
                    stored_path: meta.stored_path.clone(),
                    exists: self.stored_exists(&meta.stored_path),
                    summary: meta.summary.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.timestamp_ms
                .cmp(&a.timestamp_ms)
                .then_with(|| a.content_hash.cmp(&b.content_hash))
        });
        entries
    }

    /// Delete the snapshots addressed by `key` and their stored copies.
    pub fn delete(&mut self, key: &str) -> anyhow::Result<usize> {
        let key: SnapshotKey = key.parse()?;
        let removed = self.index.remove_where(|hash, meta| key.matches(hash, meta));
        if removed.is_empty() {
            return Err(HistoryError::NotFound(key.to_string()).into());
        }
        for (_, meta) in &removed {
            self.remove_stored(&meta.stored_path);
        }
        self.save()?;
        tracing::info!(%key, removed = removed.len(), "deleted history entries");
        Ok(removed.len())
    }

    /// Write the index to a temporary file and rename it into place.
    pub fn save(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir).with_context(|| format!("create {}", self.dir))?;
        let path = self.dir.join(INDEX_FILE);
        let tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        let mut text = serde_json::to_string_pretty(&self.index).context("serialize history index")?;
        text.push('\n');
        std::fs::write(&tmp, text).with_context(|| format!("write {tmp}"))?;
        std::fs::rename(&tmp, &path).with_context(|| format!("rename {tmp} -> {path}"))?;
        tracing::debug!(%path, total = self.index.total(), "saved history index");
        Ok(())
    }

    fn remove_stored(&self, stored_path: &str) {
        let path = self.resolve(stored_path);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(%path, error = %e, "failed to remove stored snapshot copy"),
        }
    }
}

fn load_index(path: &Utf8Path) -> anyhow::Result<HistoryIndex> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HistoryIndex::default()),
        Err(e) => return Err(e).with_context(|| format!("read history index {path}")),
    };
    match serde_json::from_slice(&bytes) {
        Ok(index) => Ok(index),
        Err(e) => {
            tracing::warn!(%path, error = %e, "history index is corrupt; starting empty");
            Ok(HistoryIndex::default())
        }
    }
}
