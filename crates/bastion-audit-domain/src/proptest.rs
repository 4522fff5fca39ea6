//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - IPv4 range arithmetic at and around the boundaries
//! - keep-first duplicate classification
//! - ops exemption and exclude-over-include precedence
//! - history-gated long-standing reasons

use crate::checks::{PolicyRules, find_duplicates, in_range};
use crate::engine::{evaluate, evaluate_sheet, sensitive_keys};
use crate::model::{Record, Workbook};
use crate::policy::HostPattern;
use crate::test_support::{grant, policy, sheet};
use bastion_audit_types::ReasonCode;
use proptest::prelude::*;
use serde_json::json;
use std::net::Ipv4Addr;

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

fn arb_host_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,6}(-(prd|uat|dev|master|maindb|[a-z0-9]{1,4})){0,3}")
        .unwrap()
}

fn arb_ip() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<u32>().prop_map(|v| Ipv4Addr::from(v).to_string()),
        (150u8..=190).prop_map(|last| format!("192.168.240.{last}")),
        Just("192.168.240.181".to_string()),
    ]
}

fn arb_grant() -> impl Strategy<Value = Record> {
    (arb_ip(), arb_host_name(), prop::string::string_regex("[a-z]{1,5}").unwrap())
        .prop_map(|(ip, host, account)| grant(&ip, &host, &account))
}

fn dotted(v: u32) -> String {
    Ipv4Addr::from(v).to_string()
}

proptest! {
    #[test]
    fn in_range_matches_numeric_comparison(ip in any::<u32>(), a in any::<u32>(), b in any::<u32>()) {
        let (start, end) = (a.min(b), a.max(b));
        prop_assert_eq!(
            in_range(&dotted(ip), &dotted(start), &dotted(end)),
            start <= ip && ip <= end
        );
    }

    #[test]
    fn in_range_includes_bounds_and_excludes_neighbours(start in 1u32..u32::MAX - 1, width in 0u32..1024) {
        let end = start.saturating_add(width).min(u32::MAX - 1);
        let (s, e) = (dotted(start), dotted(end));
        prop_assert!(in_range(&s, &s, &e));
        prop_assert!(in_range(&e, &s, &e));
        prop_assert!(!in_range(&dotted(start - 1), &s, &e));
        prop_assert!(!in_range(&dotted(end + 1), &s, &e));
    }

    #[test]
    fn identical_keys_flag_all_but_first(n in 1usize..20, shuffle_fields in any::<bool>()) {
        let cfg = policy();
        let records: Vec<Record> = (0..n)
            .map(|i| {
                if shuffle_fields && i % 2 == 1 {
                    // Same values, different column order.
                    let f = &cfg.fields;
                    Record::from_fields([
                        (f.account.clone(), json!("root")),
                        (f.host_name.clone(), json!("db-01")),
                        (f.host_ip.clone(), json!("10.0.0.1")),
                    ])
                } else {
                    grant("10.0.0.1", "db-01", "root")
                }
            })
            .collect();
        let dups = find_duplicates(&records, &cfg.duplicate_key);
        prop_assert_eq!(dups.len(), n - 1);
        prop_assert_eq!(dups.into_iter().collect::<Vec<_>>(), (1..n).collect::<Vec<_>>());
    }

    #[test]
    fn ops_owners_never_get_policy_reasons(records in prop::collection::vec(arb_grant(), 0..12)) {
        let cfg = policy();
        let ops_sheet = sheet("张涛已授权主机", records);

        let mut no_roster = policy();
        no_roster.ops_personnel.clear();
        let history = sensitive_keys(&Workbook { sheets: vec![ops_sheet.clone()] }, &no_roster);

        let result = evaluate_sheet(&ops_sheet, Some(&history), &cfg);
        for record in &result.records {
            prop_assert!(record.reasons.iter().all(|r| r.code == ReasonCode::DuplicateGrant));
        }
    }

    #[test]
    fn excluded_hosts_are_never_production(prefix in "[a-z]{0,4}", suffix in "[a-z]{0,4}") {
        let mut cfg = policy();
        cfg.production.include.push(HostPattern::regex(".*").unwrap());
        let rules = PolicyRules::new(&cfg);
        let host = format!("{prefix}prd-uat{suffix}");
        prop_assert!(!rules.is_production_host(Some(&host)));
    }

    #[test]
    fn long_standing_reason_requires_history(host in arb_host_name(), ip in arb_ip()) {
        let cfg = policy();
        let name = "李四已授权主机";
        let record = grant(&ip, &host, "root");
        let current = sheet(name, vec![record.clone()]);
        let history = sensitive_keys(&Workbook { sheets: vec![current] }, &cfg);

        let with_history = evaluate(&record, name, history.get(name), &cfg);
        let without_history = evaluate(&record, name, None, &cfg);

        prop_assert!(!without_history.should_delete);
        prop_assert_eq!(with_history.should_delete, history.contains_key(name));
    }
}
