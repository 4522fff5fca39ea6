use crate::model::Record;
use std::collections::{BTreeSet, HashSet};

/// Indices of records whose composite key was already seen earlier in the sheet.
///
/// The key is the configured fields' values in order, missing values as `""`.
/// The first occurrence of every key is kept, so input order decides which copy
/// survives. An empty key list disables detection.
pub fn find_duplicates(records: &[Record], key_fields: &[String]) -> BTreeSet<usize> {
    let mut duplicates = BTreeSet::new();
    if key_fields.is_empty() {
        return duplicates;
    }

    let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let key: Vec<String> = key_fields
            .iter()
            .map(|field| record.text_or_empty(field))
            .collect();
        if !seen.insert(key) {
            duplicates.insert(index);
        }
    }
    duplicates
}
