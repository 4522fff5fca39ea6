//! Manual flag changes on a completed check.

use bastion_audit_types::{CheckReport, CheckSummary};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmendError {
    #[error("sheet {sheet:?} is not part of this check")]
    UnknownSheet { sheet: String },
    #[error("record index {index} is out of range for sheet {sheet:?} ({len} records)")]
    IndexOutOfRange {
        sheet: String,
        index: usize,
        len: usize,
    },
    #[error("check session {token:?} is unknown or has expired")]
    SessionExpired { token: String },
}

/// Set the delete flag of one record and recompute the summary.
///
/// Reasons are kept when a record is unflagged, so re-flagging it restores them, but the
/// summary only counts reasons of records that are still flagged.
pub fn update_record_flag(
    report: &mut CheckReport,
    sheet: &str,
    index: usize,
    should_delete: bool,
) -> Result<CheckSummary, AmendError> {
    let result = report
        .sheet_mut(sheet)
        .ok_or_else(|| AmendError::UnknownSheet {
            sheet: sheet.to_string(),
        })?;
    let len = result.records.len();
    let record = result
        .records
        .get_mut(index)
        .ok_or_else(|| AmendError::IndexOutOfRange {
            sheet: sheet.to_string(),
            index,
            len,
        })?;

    if record.should_delete != should_delete {
        tracing::info!(sheet, index, should_delete, "record flag changed");
    }
    record.should_delete = should_delete;
    report.summary = CheckSummary::from_sheets(&report.sheets);
    Ok(report.summary.clone())
}
