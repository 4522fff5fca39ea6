//! Pure policy evaluation (no IO).
//!
//! Input: a workbook model read elsewhere, plus the sensitive permission keys of a
//! historical snapshot when one is available.
//! Output: per-record verdicts + summary data.

#![forbid(unsafe_code)]

pub mod annotate;
pub mod checks;
pub mod model;
pub mod policy;
pub mod report;

mod engine;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use engine::{
    HistoricalKeys, Verdict, evaluate, evaluate_sheet, evaluate_workbook, sensitive_keys,
};
