//! CLI entry point for bastion-audit.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All business logic lives in the `bastion-audit-app` crate.

use anyhow::Context;
use bastion_audit_app::{
    CheckInput, DEFAULT_CONFIG_FILE, DEFAULT_HISTORY_DIR, ExplainOutput, ExportInput,
    delete_history_entry, export_workbook, list_history, load_config, parse_report_json,
    prune_history, render_markdown, report_exit_code, run_check, run_explain, update_record_flag,
    write_report, write_text,
};
use bastion_audit_history::{HistoryStore, SystemClock};
use bastion_audit_settings::{Overrides, ResolvedConfig};
use bastion_audit_types::CheckReport;
use bastion_audit_workbook::JsonWorkbookAdapter;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_REPORT: &str = "artifacts/bastion-audit/report.json";

#[derive(Parser, Debug)]
#[command(
    name = "bastion-audit",
    version,
    about = "Policy audit for bastion-host authorization grants"
)]
struct Cli {
    /// Path to bastion-audit config TOML (missing file means defaults).
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: Utf8PathBuf,

    /// Override profile (default|strict).
    #[arg(long)]
    profile: Option<String>,

    /// Override the long-standing access threshold in days.
    #[arg(long)]
    threshold_days: Option<u32>,

    /// Override the maximum number of retained snapshots.
    #[arg(long)]
    retention_max: Option<u32>,

    /// Override the history directory.
    #[arg(long)]
    history_dir: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a workbook against policy and history, and record a snapshot.
    Check {
        /// Workbook to check.
        source: Utf8PathBuf,

        /// Where to write the JSON report.
        #[arg(long, default_value = DEFAULT_REPORT)]
        report_out: Utf8PathBuf,

        /// Write a Markdown report alongside the JSON.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown report (if enabled).
        #[arg(long, default_value = "artifacts/bastion-audit/report.md")]
        markdown_out: Utf8PathBuf,
    },

    /// Set or clear the delete flag of one record in a report.
    Flag {
        #[arg(long, default_value = DEFAULT_REPORT)]
        report: Utf8PathBuf,

        /// Sheet name as it appears in the report.
        #[arg(long)]
        sheet: String,

        /// Zero-based record index within the sheet.
        #[arg(long)]
        index: usize,

        /// Clear the flag instead of setting it.
        #[arg(long)]
        unset: bool,
    },

    /// Write the checked workbook with a delete-marker column.
    Export {
        #[arg(long, default_value = DEFAULT_REPORT)]
        report: Utf8PathBuf,

        /// Source workbook (defaults to the path recorded in the report).
        #[arg(long)]
        source: Option<Utf8PathBuf>,

        /// Where to write the annotated workbook.
        #[arg(long, short)]
        output: Utf8PathBuf,

        /// Export even if the source changed since the check.
        #[arg(long)]
        allow_changed_source: bool,
    },

    /// Render markdown from an existing JSON report.
    Md {
        #[arg(long, default_value = DEFAULT_REPORT)]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Inspect and maintain the snapshot history.
    History {
        #[command(subcommand)]
        cmd: HistoryCommands,
    },

    /// Explain a reason code with remediation guidance.
    Explain {
        /// The reason code (e.g. "duplicate_grant").
        identifier: String,
    },

    /// Write a starter config populated from a preset.
    InitConfig {
        /// Preset to start from.
        #[arg(long, default_value = "default")]
        preset: String,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Print the JSON schema of the config file.
    ConfigSchema,
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// List snapshots, newest first.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Delete `<hash>@<timestamp_ms>` or every snapshot of `<hash>`.
    Delete { key: String },
    /// Drop entries whose stored copy is missing.
    Prune,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bastion_audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.cmd {
        Commands::Check {
            source,
            report_out,
            write_markdown,
            markdown_out,
        } => cmd_check(&cli, source, report_out, *write_markdown, markdown_out),
        Commands::Flag {
            report,
            sheet,
            index,
            unset,
        } => cmd_flag(report, sheet, *index, !*unset),
        Commands::Export {
            report,
            source,
            output,
            allow_changed_source,
        } => cmd_export(&cli, report, source.as_deref(), output, *allow_changed_source),
        Commands::Md { report, output } => cmd_md(report, output.as_deref()),
        Commands::History { cmd } => cmd_history(&cli, cmd),
        Commands::Explain { identifier } => cmd_explain(identifier),
        Commands::InitConfig { preset, force } => cmd_init_config(&cli, preset, *force),
        Commands::ConfigSchema => cmd_config_schema(),
    }
}

fn resolve(cli: &Cli) -> anyhow::Result<ResolvedConfig> {
    // Missing config file is allowed; defaults apply.
    let cfg_text = match std::fs::read_to_string(&cli.config) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("read config: {}", cli.config)),
    };
    let overrides = Overrides {
        profile: cli.profile.clone(),
        threshold_days: cli.threshold_days,
        retention_max: cli.retention_max,
        history_dir: cli.history_dir.clone(),
    };
    load_config(&cfg_text, overrides)
}

fn open_history(resolved: &ResolvedConfig) -> anyhow::Result<HistoryStore> {
    let dir = resolved
        .history_dir
        .clone()
        .unwrap_or_else(|| DEFAULT_HISTORY_DIR.to_string());
    HistoryStore::open(Utf8Path::new(&dir)).with_context(|| format!("open history: {dir}"))
}

fn cmd_check(
    cli: &Cli,
    source: &Utf8Path,
    report_out: &Utf8Path,
    write_markdown: bool,
    markdown_out: &Utf8Path,
) -> anyhow::Result<()> {
    let result = (|| -> anyhow::Result<i32> {
        let resolved = resolve(cli)?;
        let mut store = open_history(&resolved)?;
        let output = run_check(CheckInput {
            source,
            config: &resolved.effective,
            store: &mut store,
            clock: &SystemClock,
            adapter: &JsonWorkbookAdapter,
        })?;
        write_report(report_out, &output.report)?;
        if write_markdown {
            write_text(markdown_out, &render_markdown(&output.report))?;
        }
        let s = &output.report.summary;
        println!(
            "bastion-audit: {} sheets, {} records, {} flagged",
            s.total_sheets, s.total_records, s.flagged
        );
        Ok(report_exit_code(&output.report))
    })();
    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("bastion-audit error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn read_report(path: &Utf8Path) -> anyhow::Result<CheckReport> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read report: {path}"))?;
    parse_report_json(&text)
}

fn cmd_flag(report_path: &Utf8Path, sheet: &str, index: usize, flag: bool) -> anyhow::Result<()> {
    let mut report = read_report(report_path)?;
    let summary = update_record_flag(&mut report, sheet, index, flag)?;
    write_report(report_path, &report)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("serialize summary")?
    );
    Ok(())
}

fn cmd_export(
    cli: &Cli,
    report_path: &Utf8Path,
    source: Option<&Utf8Path>,
    output: &Utf8Path,
    allow_changed_source: bool,
) -> anyhow::Result<()> {
    let resolved = resolve(cli)?;
    let report = read_report(report_path)?;
    let source = source.unwrap_or(Utf8Path::new(&report.source.path));
    let exported = export_workbook(ExportInput {
        source,
        report: &report,
        fields: &resolved.effective.fields,
        adapter: &JsonWorkbookAdapter,
        output,
        allow_changed_source,
    })?;
    println!("bastion-audit: marked {} records in {output}", exported.marked);
    Ok(())
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<()> {
    let report = read_report(report_path)?;
    let md = render_markdown(&report);
    if let Some(out_path) = output {
        write_text(out_path, &md).context("write markdown output")?;
    } else {
        print!("{}", md);
    }
    Ok(())
}

fn cmd_history(cli: &Cli, cmd: &HistoryCommands) -> anyhow::Result<()> {
    let resolved = resolve(cli)?;
    let mut store = open_history(&resolved)?;
    match cmd {
        HistoryCommands::List { json } => {
            let entries = list_history(&store);
            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&entries).context("serialize history")?
                );
            } else if entries.is_empty() {
                println!("No snapshots recorded.");
            } else {
                for e in entries {
                    let missing = if e.exists { "" } else { " (missing)" };
                    println!(
                        "{}  {}  flagged={}{missing}",
                        e.key, e.source_name, e.summary.flagged
                    );
                }
            }
        }
        HistoryCommands::Delete { key } => {
            let removed = delete_history_entry(&mut store, key)?;
            println!("bastion-audit: deleted {removed} snapshots");
        }
        HistoryCommands::Prune => {
            let pruned = prune_history(&mut store)?;
            println!("bastion-audit: pruned {pruned} entries");
        }
    }
    Ok(())
}

fn cmd_explain(identifier: &str) -> anyhow::Result<()> {
    match run_explain(identifier) {
        ExplainOutput::Found(exp) => {
            print!("{}", bastion_audit_app::format_explanation(&exp));
            Ok(())
        }
        ExplainOutput::NotFound {
            identifier,
            available_codes,
        } => {
            eprint!(
                "{}",
                bastion_audit_app::format_not_found(&identifier, available_codes)
            );
            std::process::exit(1);
        }
    }
}

fn cmd_init_config(cli: &Cli, preset: &str, force: bool) -> anyhow::Result<()> {
    if !bastion_audit_settings::PRESETS.contains(&preset) {
        anyhow::bail!(
            "unknown preset: {preset} (expected one of {})",
            bastion_audit_settings::PRESETS.join(", ")
        );
    }
    if cli.config.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", cli.config);
    }
    let text = bastion_audit_settings::render_config_toml(&bastion_audit_settings::preset(preset))?;
    write_text(&cli.config, &text)?;
    println!("bastion-audit: wrote {}", cli.config);
    Ok(())
}

fn cmd_config_schema() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(bastion_audit_settings::AuditConfigV1);
    println!(
        "{}",
        serde_json::to_string_pretty(&schema).context("serialize schema")?
    );
    Ok(())
}
