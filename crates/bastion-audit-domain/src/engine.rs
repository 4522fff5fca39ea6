use crate::checks::{PolicyRules, find_duplicates};
use crate::model::{PermissionKey, Record, Sheet, Workbook};
use crate::policy::PolicyConfig;
use crate::report::WorkbookEvaluation;
use bastion_audit_types::{CheckSummary, Reason, RecordResult, SheetResult, saturating_count};
use std::collections::{BTreeMap, BTreeSet};

/// Sensitive permission keys of a historical snapshot, by sheet name.
pub type HistoricalKeys = BTreeMap<String, BTreeSet<PermissionKey>>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Verdict {
    pub should_delete: bool,
    pub reasons: Vec<Reason>,
}

impl Verdict {
    fn push(&mut self, reason: Reason) {
        self.should_delete = true;
        self.reasons.push(reason);
    }
}

/// Policy verdict for one record of the sheet `sheet_name`.
///
/// Production and master-database grants are only flagged when the same
/// permission key was present in the historical snapshot for this sheet, which
/// proves the grant outlived the threshold window. Without history nothing is
/// flagged. Duplicate flags are applied per sheet by [`evaluate_sheet`].
pub fn evaluate(
    record: &Record,
    sheet_name: &str,
    historical: Option<&BTreeSet<PermissionKey>>,
    cfg: &PolicyConfig,
) -> Verdict {
    let mut verdict = Verdict::default();
    let rules = PolicyRules::new(cfg);
    if rules.is_ops_personnel(sheet_name) {
        return verdict;
    }

    let fields = &cfg.fields;
    let host_ip = record.text(&fields.host_ip);
    let host_name = record.text(&fields.host_name);
    let is_prod = rules.is_production_host(host_name.as_deref());
    let is_master_db = rules.is_master_database(host_ip.as_deref(), host_name.as_deref());
    if !is_prod && !is_master_db {
        return verdict;
    }

    let Some(historical) = historical else {
        return verdict;
    };
    if !historical.contains(&PermissionKey::from_record(record, fields)) {
        return verdict;
    }

    if is_prod {
        verdict.push(Reason::long_standing_production(cfg.threshold_days));
    }
    if is_master_db {
        verdict.push(Reason::long_standing_master_db(cfg.threshold_days));
    }
    verdict
}

/// Evaluate every record of one sheet in order, then overlay duplicate flags.
pub fn evaluate_sheet(
    sheet: &Sheet,
    historical: Option<&HistoricalKeys>,
    cfg: &PolicyConfig,
) -> SheetResult {
    let rules = PolicyRules::new(cfg);
    let historical = historical.and_then(|h| h.get(&sheet.name));

    let mut records: Vec<RecordResult> = sheet
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let verdict = evaluate(record, &sheet.name, historical, cfg);
            RecordResult {
                index: saturating_count(index),
                should_delete: verdict.should_delete,
                reasons: verdict.reasons,
                fields: record.without(&cfg.fields.delete_marker),
            }
        })
        .collect();

    for index in find_duplicates(&sheet.records, &cfg.duplicate_key) {
        let result = &mut records[index];
        result.should_delete = true;
        result.reasons.push(Reason::duplicate_grant());
    }

    SheetResult {
        name: sheet.name.clone(),
        owner: rules.owner_name(&sheet.name).to_string(),
        ops_exempt: rules.is_ops_personnel(&sheet.name),
        records,
    }
}

/// Evaluate all authorized-hosts sheets of a workbook and aggregate a summary.
pub fn evaluate_workbook(
    workbook: &Workbook,
    historical: Option<&HistoricalKeys>,
    cfg: &PolicyConfig,
) -> WorkbookEvaluation {
    let sheets: Vec<SheetResult> = workbook
        .sheets
        .iter()
        .filter(|sheet| cfg.is_authorized_sheet(&sheet.name))
        .map(|sheet| evaluate_sheet(sheet, historical, cfg))
        .collect();
    let summary = CheckSummary::from_sheets(&sheets);
    WorkbookEvaluation { sheets, summary }
}

/// Permission keys of production or master-database grants held by non-ops
/// owners, for every authorized-hosts sheet that has any.
pub fn sensitive_keys(workbook: &Workbook, cfg: &PolicyConfig) -> HistoricalKeys {
    let rules = PolicyRules::new(cfg);
    let fields = &cfg.fields;
    let mut out = HistoricalKeys::new();

    for sheet in &workbook.sheets {
        if !cfg.is_authorized_sheet(&sheet.name) || rules.is_ops_personnel(&sheet.name) {
            continue;
        }
        let keys: BTreeSet<PermissionKey> = sheet
            .records
            .iter()
            .filter(|record| {
                let host_ip = record.text(&fields.host_ip);
                let host_name = record.text(&fields.host_name);
                rules.is_production_host(host_name.as_deref())
                    || rules.is_master_database(host_ip.as_deref(), host_name.as_deref())
            })
            .map(|record| PermissionKey::from_record(record, fields))
            .collect();
        if !keys.is_empty() {
            out.insert(sheet.name.clone(), keys);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{grant, policy, sheet};
    use bastion_audit_types::ReasonCode;

    fn codes(result: &RecordResult) -> Vec<ReasonCode> {
        result.reasons.iter().map(|r| r.code).collect()
    }

    fn history_for(sheet: &Sheet, cfg: &PolicyConfig) -> HistoricalKeys {
        sensitive_keys(
            &Workbook {
                sheets: vec![sheet.clone()],
            },
            cfg,
        )
    }

    #[test]
    fn nothing_flagged_without_history() {
        let cfg = policy();
        let sheet = sheet(
            "李四已授权主机",
            vec![grant("10.1.0.1", "crm-prd-01", "root")],
        );
        let result = evaluate_sheet(&sheet, None, &cfg);
        assert!(!result.records[0].should_delete);
        assert!(result.records[0].reasons.is_empty());
    }

    #[test]
    fn persisting_production_grant_is_flagged() {
        let cfg = policy();
        let sheet = sheet(
            "李四已授权主机",
            vec![
                grant("10.1.0.1", "crm-prd-01", "root"),
                grant("10.1.0.2", "crm-dev-01", "root"),
            ],
        );
        let history = history_for(&sheet, &cfg);

        let result = evaluate_sheet(&sheet, Some(&history), &cfg);
        assert_eq!(codes(&result.records[0]), vec![ReasonCode::LongStandingProduction]);
        assert!(result.records[0].should_delete);
        assert!(!result.records[1].should_delete);
    }

    #[test]
    fn grant_not_in_history_is_not_flagged() {
        let cfg = policy();
        let old = sheet(
            "李四已授权主机",
            vec![grant("10.1.0.1", "crm-prd-01", "root")],
        );
        let history = history_for(&old, &cfg);

        let current = sheet(
            "李四已授权主机",
            vec![grant("10.1.0.1", "crm-prd-01", "deploy")],
        );
        let result = evaluate_sheet(&current, Some(&history), &cfg);
        assert!(!result.records[0].should_delete);
    }

    #[test]
    fn history_of_another_sheet_does_not_apply() {
        let cfg = policy();
        let old = sheet(
            "王五已授权主机",
            vec![grant("10.1.0.1", "crm-prd-01", "root")],
        );
        let history = history_for(&old, &cfg);

        let current = sheet(
            "李四已授权主机",
            vec![grant("10.1.0.1", "crm-prd-01", "root")],
        );
        let result = evaluate_sheet(&current, Some(&history), &cfg);
        assert!(!result.records[0].should_delete);
    }

    #[test]
    fn production_and_master_db_reasons_both_apply() {
        let cfg = policy();
        let sheet = sheet(
            "李四已授权主机",
            vec![grant("192.168.240.181", "order-prd-master", "dba")],
        );
        let history = history_for(&sheet, &cfg);

        let result = evaluate_sheet(&sheet, Some(&history), &cfg);
        assert_eq!(
            codes(&result.records[0]),
            vec![
                ReasonCode::LongStandingProduction,
                ReasonCode::LongStandingMasterDb
            ]
        );
    }

    #[test]
    fn ops_owner_only_gets_duplicate_flags() {
        let cfg = policy();
        let sheet = sheet(
            "张涛已授权主机",
            vec![
                grant("192.168.240.181", "order-prd-master", "dba"),
                grant("192.168.240.181", "order-prd-master", "dba"),
            ],
        );
        // Build history as if the owner were not on the roster.
        let mut no_roster = policy();
        no_roster.ops_personnel.clear();
        let history = history_for(&sheet, &no_roster);
        assert!(!history.is_empty());

        let result = evaluate_sheet(&sheet, Some(&history), &cfg);
        assert!(result.ops_exempt);
        assert!(!result.records[0].should_delete);
        assert_eq!(codes(&result.records[1]), vec![ReasonCode::DuplicateGrant]);
    }

    #[test]
    fn duplicate_reason_is_appended_after_policy_reasons() {
        let cfg = policy();
        let sheet = sheet(
            "李四已授权主机",
            vec![
                grant("10.1.0.1", "crm-prd-01", "root"),
                grant("10.1.0.1", "crm-prd-01", "root"),
            ],
        );
        let history = history_for(&sheet, &cfg);

        let result = evaluate_sheet(&sheet, Some(&history), &cfg);
        assert_eq!(codes(&result.records[0]), vec![ReasonCode::LongStandingProduction]);
        assert_eq!(
            codes(&result.records[1]),
            vec![ReasonCode::LongStandingProduction, ReasonCode::DuplicateGrant]
        );
    }

    #[test]
    fn workbook_skips_unauthorized_sheets() {
        let cfg = policy();
        let workbook = Workbook {
            sheets: vec![
                sheet("说明", vec![grant("10.0.0.1", "a", "x")]),
                sheet(
                    "李四已授权主机",
                    vec![grant("10.0.0.1", "a", "x"), grant("10.0.0.1", "a", "x")],
                ),
            ],
        };
        let eval = evaluate_workbook(&workbook, None, &cfg);
        assert_eq!(eval.sheets.len(), 1);
        assert_eq!(eval.summary.total_sheets, 1);
        assert_eq!(eval.summary.total_records, 2);
        assert_eq!(eval.summary.flagged, 1);
        assert_eq!(eval.sheets[0].owner, "李四");
    }

    #[test]
    fn sensitive_keys_skip_ops_and_plain_hosts() {
        let cfg = policy();
        let workbook = Workbook {
            sheets: vec![
                sheet(
                    "张涛已授权主机",
                    vec![grant("10.1.0.1", "crm-prd-01", "root")],
                ),
                sheet(
                    "李四已授权主机",
                    vec![
                        grant("10.1.0.1", "crm-prd-01", "root"),
                        grant("10.1.0.9", "crm-dev-01", "root"),
                    ],
                ),
            ],
        };
        let keys = sensitive_keys(&workbook, &cfg);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys["李四已授权主机"].len(), 1);
    }

    #[test]
    fn result_fields_drop_existing_delete_marker() {
        let cfg = policy();
        let mut record = grant("10.0.0.1", "a", "x");
        record.set_trailing(&cfg.fields.delete_marker, serde_json::json!("删除"));
        let sheet = sheet("李四已授权主机", vec![record]);
        let result = evaluate_sheet(&sheet, None, &cfg);
        assert!(
            !result.records[0]
                .fields
                .contains_key(&cfg.fields.delete_marker)
        );
    }
}
