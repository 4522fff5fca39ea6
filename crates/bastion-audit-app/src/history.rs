//! History maintenance use cases.

use bastion_audit_history::{HistoryEntry, HistoryStore};

pub fn list_history(store: &HistoryStore) -> Vec<HistoryEntry> {
    store.list()
}

/// Delete by `hash@timestamp_ms` (one snapshot) or `hash` (every snapshot of that file).
pub fn delete_history_entry(store: &mut HistoryStore, key: &str) -> anyhow::Result<usize> {
    store.delete(key)
}

/// Drop entries whose stored copy is gone.
pub fn prune_history(store: &mut HistoryStore) -> anyhow::Result<usize> {
    let pruned = store.prune_missing()?;
    tracing::info!(pruned, "pruned history");
    Ok(pruned)
}
