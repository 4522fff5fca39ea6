//! Workbook adapters: read grant workbooks from disk and write annotated copies.
//!
//! This crate is allowed to do filesystem IO. Parsing is split from IO so the same bytes
//! that were hashed are the bytes that get evaluated.

#![forbid(unsafe_code)]

mod json;

use anyhow::Context;
use bastion_audit_domain::model::Workbook;
use camino::Utf8Path;

pub use json::JsonWorkbookAdapter;

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
pub mod fuzz {
    use super::*;

    /// Parse arbitrary bytes as a JSON workbook. **Never panics** on any input.
    pub fn parse_json_workbook(bytes: &[u8]) -> anyhow::Result<()> {
        let _ = JsonWorkbookAdapter.parse(bytes)?;
        Ok(())
    }
}

/// A workbook file format.
pub trait WorkbookAdapter {
    /// Parse raw file bytes into sheets of records.
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<Workbook>;

    /// Serialize a workbook, keeping sheet order and per-record field order.
    fn serialize(&self, workbook: &Workbook) -> anyhow::Result<Vec<u8>>;

    /// Read and parse a workbook file.
    fn read(&self, path: &Utf8Path) -> anyhow::Result<Workbook> {
        let bytes = std::fs::read(path).with_context(|| format!("read workbook {path}"))?;
        self.parse(&bytes)
            .with_context(|| format!("parse workbook {path}"))
    }

    /// Serialize and write a workbook, creating parent directories as needed.
    fn write(&self, workbook: &Workbook, path: &Utf8Path) -> anyhow::Result<()> {
        let bytes = self.serialize(workbook)?;
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        std::fs::write(path, bytes).with_context(|| format!("write workbook {path}"))?;
        tracing::debug!(%path, sheets = workbook.sheets.len(), "wrote workbook");
        Ok(())
    }
}
