use anyhow::Context;
use bastion_audit_types::{CheckReport, SCHEMA_REPORT_V1};
use camino::Utf8Path;

pub fn parse_report_json(text: &str) -> anyhow::Result<CheckReport> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;
    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if schema != SCHEMA_REPORT_V1 {
        anyhow::bail!("unknown report schema: {schema:?} (expected {SCHEMA_REPORT_V1})");
    }
    serde_json::from_value(value).context("parse bastion-audit report")
}

pub fn serialize_report(report: &CheckReport) -> anyhow::Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(report).context("serialize report")?;
    out.push(b'\n');
    Ok(out)
}

pub fn write_report(path: &Utf8Path, report: &CheckReport) -> anyhow::Result<()> {
    let data = serialize_report(report)?;
    write_bytes(path, &data).with_context(|| format!("write report: {path}"))
}

pub fn write_text(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    write_bytes(path, text.as_bytes()).with_context(|| format!("write text: {path}"))
}

fn write_bytes(path: &Utf8Path, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
