//! Stable DTOs and IDs used across the bastion-audit workspace.
//!
//! This crate is intentionally boring:
//! - data types for the emitted check report
//! - stable string IDs and reason codes
//! - explain registry for remediation guidance

#![forbid(unsafe_code)]

pub mod explain;
pub mod ids;
pub mod receipt;

pub use explain::{Explanation, lookup_explanation};
pub use receipt::{
    CheckReport, CheckSummary, ComparisonMeta, Reason, ReasonCode, RecordResult, SCHEMA_REPORT_V1,
    SheetResult, SourceMeta, ToolMeta, saturating_count,
};
