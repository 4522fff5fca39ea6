use bastion_audit_types::{CheckSummary, SheetResult};

/// Results of one workbook pass: per-sheet verdicts plus the aggregate summary.
#[derive(Clone, Debug)]
pub struct WorkbookEvaluation {
    pub sheets: Vec<SheetResult>,
    pub summary: CheckSummary,
}
