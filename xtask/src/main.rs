//! Developer tasks: JSON schemas for the report and config formats, explain coverage.

use anyhow::{Context, bail};
use schemars::{Schema, schema_for};
use std::fs;
use std::path::PathBuf;

/// Checked-in schemas, by file name under `schemas/`.
const SCHEMAS: &[(&str, fn() -> Schema)] = &[
    ("bastion-audit.report.v1.json", || {
        schema_for!(bastion_audit_types::CheckReport)
    }),
    ("bastion-audit.config.v1.json", || {
        schema_for!(bastion_audit_settings::AuditConfigV1)
    }),
];

const COMMANDS: &[(&str, &str)] = &[
    ("emit-schemas", "write schemas/ from the Rust types"),
    ("validate-schemas", "fail if schemas/ is stale (CI)"),
    ("print-schema-ids", "list schema ids"),
    ("explain-coverage", "fail if a reason code lacks an explanation"),
];

fn schemas_dir() -> anyhow::Result<PathBuf> {
    let manifest_dir = match std::env::var_os("CARGO_MANIFEST_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("determine current directory")?,
    };
    let root = match manifest_dir.parent() {
        Some(parent) if manifest_dir.ends_with("xtask") => parent.to_path_buf(),
        _ => manifest_dir,
    };
    Ok(root.join("schemas"))
}

fn render(generate: fn() -> Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(&generate()).context("serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    for (name, generate) in SCHEMAS {
        let path = dir.join(name);
        fs::write(&path, render(*generate)?).with_context(|| format!("write {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    let mut stale = Vec::new();
    for (name, generate) in SCHEMAS {
        let path = dir.join(name);
        match fs::read_to_string(&path) {
            Ok(actual) if actual == render(*generate)? => {}
            Ok(_) => stale.push(format!("{name} (out of date)")),
            Err(_) => stale.push(format!("{name} (missing)")),
        }
    }
    if stale.is_empty() {
        println!("schemas up to date");
        return Ok(());
    }
    for entry in &stale {
        eprintln!("  {entry}");
    }
    bail!("{} stale schema(s); run `cargo xtask emit-schemas`", stale.len())
}

fn explain_coverage() -> anyhow::Result<()> {
    use bastion_audit_types::explain::{all_codes, lookup_explanation};

    let gaps: Vec<String> = all_codes()
        .iter()
        .filter_map(|code| match lookup_explanation(code) {
            None => Some(format!("{code}: no explanation")),
            Some(exp) => {
                let empty: Vec<&str> = [
                    ("title", exp.title),
                    ("description", exp.description),
                    ("remediation", exp.remediation),
                ]
                .into_iter()
                .filter(|(_, text)| text.is_empty())
                .map(|(field, _)| field)
                .collect();
                (!empty.is_empty()).then(|| format!("{code}: empty {}", empty.join(", ")))
            }
        })
        .collect();

    if gaps.is_empty() {
        println!("{} reason codes explained", all_codes().len());
        return Ok(());
    }
    for gap in &gaps {
        eprintln!("  {gap}");
    }
    bail!("{} reason code(s) lack explanations", gaps.len())
}

fn main() -> anyhow::Result<()> {
    match std::env::args().nth(1).as_deref().unwrap_or("help") {
        "help" | "--help" | "-h" => {
            eprintln!("xtask commands:");
            for (name, about) in COMMANDS {
                eprintln!("  {name:<18}{about}");
            }
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for (name, _) in SCHEMAS {
                println!("{}", name.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other} (try `cargo xtask help`)"),
    }
}
