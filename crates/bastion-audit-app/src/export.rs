//! The `export` use case: write the checked workbook back with its delete-marker column.

use anyhow::Context;
use bastion_audit_domain::annotate::apply_delete_markers;
use bastion_audit_domain::policy::FieldMap;
use bastion_audit_history::content_hash;
use bastion_audit_types::CheckReport;
use bastion_audit_workbook::WorkbookAdapter;
use camino::Utf8Path;

pub struct ExportInput<'a> {
    /// The workbook the report was produced from.
    pub source: &'a Utf8Path,
    pub report: &'a CheckReport,
    pub fields: &'a FieldMap,
    pub adapter: &'a dyn WorkbookAdapter,
    pub output: &'a Utf8Path,
    /// Export even if the source changed since the check.
    pub allow_changed_source: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOutput {
    /// Records carrying the delete value.
    pub marked: usize,
}

pub fn export_workbook(input: ExportInput<'_>) -> anyhow::Result<ExportOutput> {
    let ExportInput {
        source,
        report,
        fields,
        adapter,
        output,
        allow_changed_source,
    } = input;

    let bytes = std::fs::read(source).with_context(|| format!("read source {source}"))?;
    let hash = content_hash(&bytes);
    if hash != report.source.content_hash {
        if !allow_changed_source {
            anyhow::bail!(
                "source {source} changed since the check (hash {hash}, report {})",
                report.source.content_hash
            );
        }
        tracing::warn!(%source, "exporting over a source that changed since the check");
    }

    let mut workbook = adapter
        .parse(&bytes)
        .with_context(|| format!("parse source {source}"))?;
    let marked = apply_delete_markers(&mut workbook, &report.sheets, fields);
    adapter.write(&workbook, output)?;
    tracing::info!(%output, marked, "exported annotated workbook");

    Ok(ExportOutput { marked })
}
