//! Write verdicts back onto a workbook as the delete-marker column.

use crate::model::Workbook;
use crate::policy::FieldMap;
use bastion_audit_types::SheetResult;
use serde_json::Value;

/// Set the delete marker of every evaluated record, as the last column.
///
/// Flagged records get `fields.delete_value`, all others an empty string.
/// Sheets without a result are left untouched. Returns the number of records marked.
pub fn apply_delete_markers(
    workbook: &mut Workbook,
    results: &[SheetResult],
    fields: &FieldMap,
) -> usize {
    let mut marked = 0;
    for result in results {
        let Some(sheet) = workbook.sheet_mut(&result.name) else {
            continue;
        };
        for verdict in &result.records {
            let Some(record) = sheet.records.get_mut(verdict.index as usize) else {
                continue;
            };
            let value = if verdict.should_delete {
                marked += 1;
                fields.delete_value.clone()
            } else {
                String::new()
            };
            record.set_trailing(&fields.delete_marker, Value::String(value));
        }
    }
    marked
}
