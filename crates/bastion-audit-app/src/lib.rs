//! Use case orchestration for bastion-audit.
//!
//! This crate provides the application layer: use cases that coordinate the domain, settings,
//! workbook, history, and render layers. It is intentionally thin and delegates heavy lifting
//! to the appropriate layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod amend;
mod check;
mod config;
mod explain;
mod export;
mod history;
mod render;
mod report;
mod sessions;

pub use amend::{AmendError, update_record_flag};
pub use check::{CheckInput, CheckOutput, report_exit_code, run_check};
pub use config::{DEFAULT_CONFIG_FILE, DEFAULT_HISTORY_DIR, load_config};
pub use explain::{ExplainOutput, format_explanation, format_not_found, run_explain};
pub use export::{ExportInput, ExportOutput, export_workbook};
pub use history::{delete_history_entry, list_history, prune_history};
pub use render::render_markdown;
pub use report::{parse_report_json, serialize_report, write_report, write_text};
pub use sessions::{CheckSessions, run_check_session};
