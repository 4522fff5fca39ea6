use bastion_audit_types::{CheckReport, RecordResult};
use serde_json::Value;

pub fn render_markdown(report: &CheckReport) -> String {
    let mut out = String::new();

    out.push_str("# Bastion audit report\n\n");
    out.push_str(&format!("- Source: `{}`\n", report.source.path));
    out.push_str(&format!("- Threshold: {} days\n", report.threshold_days));
    match &report.comparison {
        Some(c) => out.push_str(&format!(
            "- Compared against: `{}@{}` ({} sensitive grants)\n",
            short_hash(&c.content_hash),
            c.timestamp_ms,
            c.sensitive_keys
        )),
        None => out.push_str("- Compared against: none (no snapshot in window)\n"),
    }
    let s = &report.summary;
    out.push_str(&format!(
        "- Sheets: {}, records: {}, flagged: **{}**\n\n",
        s.total_sheets, s.total_records, s.flagged
    ));

    if s.flagged == 0 {
        out.push_str("No records flagged.\n");
        return out;
    }

    out.push_str("## Reasons\n\n| Reason | Records |\n|---|---|\n");
    for (code, count) in &s.by_reason {
        out.push_str(&format!("| `{code}` | {count} |\n"));
    }
    out.push('\n');

    out.push_str("## Flagged records\n");
    for sheet in &report.sheets {
        let flagged: Vec<&RecordResult> =
            sheet.records.iter().filter(|r| r.should_delete).collect();
        if flagged.is_empty() {
            continue;
        }
        let ops = if sheet.ops_exempt { ", ops" } else { "" };
        out.push_str(&format!("\n### {} (owner: {}{ops})\n\n", sheet.name, sheet.owner));
        for record in flagged {
            let codes: Vec<String> = record
                .reasons
                .iter()
                .map(|r| format!("`{}`", r.code))
                .collect();
            let codes = if codes.is_empty() {
                "manual".to_string()
            } else {
                codes.join(", ")
            };
            out.push_str(&format!("- #{}: {codes}", record.index));
            let fields = render_fields(record);
            if !fields.is_empty() {
                out.push_str(&format!(" ({fields})"));
            }
            out.push('\n');
        }
    }

    out
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

fn render_fields(record: &RecordResult) -> String {
    record
        .fields
        .iter()
        .filter_map(|(k, v)| {
            let text = match v {
                Value::Null => return None,
                Value::String(s) if s.trim().is_empty() => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(format!("{k}={text}"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
