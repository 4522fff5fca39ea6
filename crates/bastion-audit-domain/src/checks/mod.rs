//! Per-record and per-sheet policy predicates.

pub mod duplicates;
pub mod ip_range;
pub mod rules;

pub use duplicates::find_duplicates;
pub use ip_range::{in_range, ip_to_u32};
pub use rules::PolicyRules;
