//! The `check` use case: compare a workbook against history, evaluate policy, record a snapshot.

use anyhow::Context;
use bastion_audit_domain::policy::PolicyConfig;
use bastion_audit_domain::{HistoricalKeys, evaluate_workbook, sensitive_keys};
use bastion_audit_history::{Clock, HistoryStore, Snapshot, content_hash};
use bastion_audit_types::{
    CheckReport, ComparisonMeta, SCHEMA_REPORT_V1, SourceMeta, ToolMeta, saturating_count,
};
use bastion_audit_workbook::WorkbookAdapter;
use camino::Utf8Path;
use time::OffsetDateTime;

/// Input for the check use case.
pub struct CheckInput<'a> {
    /// Workbook to audit.
    pub source: &'a Utf8Path,
    /// Effective policy.
    pub config: &'a PolicyConfig,
    pub store: &'a mut HistoryStore,
    pub clock: &'a dyn Clock,
    pub adapter: &'a dyn WorkbookAdapter,
}

/// Output from the check use case.
#[derive(Clone, Debug)]
pub struct CheckOutput {
    pub report: CheckReport,
    /// The snapshot recorded for this run.
    pub snapshot: Snapshot,
}

/// Run a full check pass.
///
/// The source is read and parsed before anything is persisted, so an unreadable or
/// malformed source leaves the history untouched. A historical copy that cannot be read
/// only disables the long-standing comparison for this run.
pub fn run_check(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    let CheckInput {
        source,
        config,
        store,
        clock,
        adapter,
    } = input;

    let now_ms = clock.now_ms();
    let started_at = datetime_from_ms(now_ms)?;

    let bytes = std::fs::read(source).with_context(|| format!("read source {source}"))?;
    let workbook = adapter
        .parse(&bytes)
        .with_context(|| format!("parse source {source}"))?;
    let hash = content_hash(&bytes);

    let comparison = store.find_snapshot_near(&hash, now_ms, config.threshold_days);
    let historical = comparison
        .as_ref()
        .and_then(|snapshot| historical_keys(snapshot, config, adapter));
    match (&comparison, &historical) {
        (Some(snapshot), Some(_)) => {
            tracing::info!(snapshot = %snapshot.key(), "comparing against historical snapshot")
        }
        (None, _) => tracing::info!(
            threshold_days = config.threshold_days,
            "no historical snapshot in window; long-standing checks inactive"
        ),
        _ => {}
    }

    let evaluation = evaluate_workbook(&workbook, historical.as_ref(), config);
    for sheet in &evaluation.sheets {
        tracing::debug!(
            sheet = %sheet.name,
            records = sheet.records.len(),
            flagged = sheet.records.iter().filter(|r| r.should_delete).count(),
            ops_exempt = sheet.ops_exempt,
            "evaluated sheet"
        );
    }

    let source_name = source.file_name().unwrap_or(source.as_str());
    let snapshot = store
        .commit_snapshot(
            source_name,
            &bytes,
            now_ms,
            evaluation.summary.clone(),
            config.retention_max,
        )
        .context("record snapshot")?;

    let comparison = match (comparison, &historical) {
        (Some(snapshot), Some(keys)) => Some(ComparisonMeta {
            content_hash: snapshot.content_hash,
            timestamp_ms: snapshot.meta.timestamp_ms,
            stored_path: snapshot.meta.stored_path,
            sensitive_keys: keys
                .values()
                .fold(0u32, |n, k| n.saturating_add(saturating_count(k.len()))),
        }),
        _ => None,
    };

    let finished_at = datetime_from_ms(clock.now_ms())?;
    tracing::info!(
        source = %source,
        sheets = evaluation.summary.total_sheets,
        records = evaluation.summary.total_records,
        flagged = evaluation.summary.flagged,
        "check complete"
    );

    let report = CheckReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "bastion-audit".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at,
        finished_at,
        source: SourceMeta {
            path: source.to_string(),
            content_hash: hash,
        },
        threshold_days: config.threshold_days,
        comparison,
        summary: evaluation.summary,
        sheets: evaluation.sheets,
    };

    Ok(CheckOutput { report, snapshot })
}

/// Re-read a stored copy and derive its sensitive keys under the current policy.
fn historical_keys(
    snapshot: &Snapshot,
    config: &PolicyConfig,
    adapter: &dyn WorkbookAdapter,
) -> Option<HistoricalKeys> {
    match adapter.read(&snapshot.path) {
        Ok(workbook) => Some(sensitive_keys(&workbook, config)),
        Err(err) => {
            tracing::warn!(
                snapshot = %snapshot.key(),
                error = %format!("{err:#}"),
                "historical snapshot unreadable; continuing without history"
            );
            None
        }
    }
}

fn datetime_from_ms(ms: i64) -> anyhow::Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .with_context(|| format!("clock returned out-of-range timestamp {ms}"))
}

/// Map a report to an exit code: 0 = nothing flagged, 2 = at least one record flagged.
pub fn report_exit_code(report: &CheckReport) -> i32 {
    if report.summary.flagged > 0 { 2 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_audit_types::CheckSummary;

    #[test]
    fn exit_code_follows_flag_count() {
        let mut summary = CheckSummary::default();
        let report = |summary: CheckSummary| CheckReport {
            schema: SCHEMA_REPORT_V1.to_string(),
            tool: ToolMeta {
                name: "bastion-audit".to_string(),
                version: "0".to_string(),
            },
            started_at: OffsetDateTime::UNIX_EPOCH,
            finished_at: OffsetDateTime::UNIX_EPOCH,
            source: SourceMeta {
                path: "x".to_string(),
                content_hash: String::new(),
            },
            threshold_days: 30,
            comparison: None,
            summary,
            sheets: Vec::new(),
        };
        assert_eq!(report_exit_code(&report(summary.clone())), 0);
        summary.flagged = 1;
        assert_eq!(report_exit_code(&report(summary)), 2);
    }

    #[test]
    fn millisecond_timestamps_convert() {
        let dt = datetime_from_ms(1_500).expect("in range");
        assert_eq!(dt.unix_timestamp(), 1);
        assert_eq!(dt.millisecond(), 500);
    }
}
