use crate::ids;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;

/// Stable schema identifier for check reports.
pub const SCHEMA_REPORT_V1: &str = "bastion-audit.report.v1";

/// Why a record was flagged for deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    LongStandingProduction,
    LongStandingMasterDb,
    DuplicateGrant,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::LongStandingProduction => ids::REASON_LONG_STANDING_PRODUCTION,
            ReasonCode::LongStandingMasterDb => ids::REASON_LONG_STANDING_MASTER_DB,
            ReasonCode::DuplicateGrant => ids::REASON_DUPLICATE_GRANT,
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Reason {
    pub code: ReasonCode,
    pub message: String,
}

impl Reason {
    pub fn long_standing_production(threshold_days: u32) -> Self {
        Self {
            code: ReasonCode::LongStandingProduction,
            message: format!(
                "non-ops owner has held production host access for at least {threshold_days} days"
            ),
        }
    }

    pub fn long_standing_master_db(threshold_days: u32) -> Self {
        Self {
            code: ReasonCode::LongStandingMasterDb,
            message: format!(
                "non-ops owner has held master database access for at least {threshold_days} days"
            ),
        }
    }

    pub fn duplicate_grant() -> Self {
        Self {
            code: ReasonCode::DuplicateGrant,
            message: "duplicate grant of an earlier record in the same sheet".to_string(),
        }
    }
}

/// Verdict for a single record, in sheet order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecordResult {
    /// Zero-based position in the source sheet.
    pub index: u32,
    pub should_delete: bool,
    #[serde(default)]
    pub reasons: Vec<Reason>,
    /// Source fields as read, without the delete marker.
    #[serde(default)]
    pub fields: Map<String, JsonValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SheetResult {
    pub name: String,
    pub owner: String,
    /// Owner matched the ops roster; only duplicate reasons can apply.
    pub ops_exempt: bool,
    pub records: Vec<RecordResult>,
}

/// Aggregate counts over all evaluated sheets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CheckSummary {
    pub total_sheets: u32,
    pub total_records: u32,
    pub flagged: u32,
    /// Reason code -> number of flagged records carrying it.
    #[serde(default)]
    pub by_reason: BTreeMap<String, u32>,
}

/// Report counts and indexes are `u32`; larger values saturate rather than wrap.
pub fn saturating_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl CheckSummary {
    /// Recompute from sheet results. Reasons are only counted for records still flagged.
    pub fn from_sheets(sheets: &[SheetResult]) -> Self {
        let mut summary = CheckSummary {
            total_sheets: saturating_count(sheets.len()),
            ..CheckSummary::default()
        };
        for sheet in sheets {
            summary.total_records = summary
                .total_records
                .saturating_add(saturating_count(sheet.records.len()));
            for record in sheet.records.iter().filter(|r| r.should_delete) {
                summary.flagged = summary.flagged.saturating_add(1);
                for reason in &record.reasons {
                    let count = summary
                        .by_reason
                        .entry(reason.code.as_str().to_string())
                        .or_insert(0);
                    *count = count.saturating_add(1);
                }
            }
        }
        summary
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceMeta {
    pub path: String,
    /// SHA-256 of the source file bytes, hex encoded.
    pub content_hash: String,
}

/// The historical snapshot the run was compared against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonMeta {
    pub content_hash: String,
    pub timestamp_ms: i64,
    pub stored_path: String,
    /// Number of sensitive permission keys found in the snapshot.
    pub sensitive_keys: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CheckReport {
    /// Versioned schema identifier for the report shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub source: SourceMeta,
    pub threshold_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonMeta>,
    pub summary: CheckSummary,
    pub sheets: Vec<SheetResult>,
}

impl CheckReport {
    pub fn sheet(&self, name: &str) -> Option<&SheetResult> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut SheetResult> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }
}
