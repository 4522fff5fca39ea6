//! Snapshot history: content hashing, the persisted index, and the store operating on it.
//!
//! This crate is allowed to do filesystem IO.

#![forbid(unsafe_code)]

mod clock;
mod error;
mod hash;
mod index;
mod store;

pub use clock::{Clock, DAY_MS, FixedClock, SystemClock};
pub use error::HistoryError;
pub use hash::content_hash;
pub use index::{HistoryIndex, SnapshotKey, SnapshotMeta};
pub use store::{HistoryEntry, HistoryStore, INDEX_FILE, SNAPSHOTS_DIR, Snapshot, tolerance_days};
