use crate::checks::ip_range::in_range;
use crate::policy::PolicyConfig;

/// Production-host, master-database, and ops-roster predicates over one policy.
#[derive(Clone, Copy, Debug)]
pub struct PolicyRules<'a> {
    cfg: &'a PolicyConfig,
}

impl<'a> PolicyRules<'a> {
    pub fn new(cfg: &'a PolicyConfig) -> Self {
        Self { cfg }
    }

    /// The part of a sheet name before the owner delimiter, trimmed.
    pub fn owner_name<'s>(&self, sheet_name: &'s str) -> &'s str {
        let delimiter = self.cfg.sheets.owner_delimiter.as_str();
        let prefix = if delimiter.is_empty() {
            sheet_name
        } else {
            sheet_name
                .split_once(delimiter)
                .map_or(sheet_name, |(owner, _)| owner)
        };
        prefix.trim()
    }

    /// Bidirectional substring match of the sheet's owner against the roster.
    pub fn is_ops_personnel(&self, sheet_name: &str) -> bool {
        let sheet_name = sheet_name.trim();
        if sheet_name.is_empty() {
            return false;
        }
        let owner = self.owner_name(sheet_name);

        self.cfg
            .ops_personnel
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .any(|name| sheet_name.contains(name) || (!owner.is_empty() && name.contains(owner)))
    }

    /// Exclude patterns are evaluated first and veto any include match.
    pub fn is_production_host(&self, host_name: Option<&str>) -> bool {
        let Some(host_name) = host_name.filter(|h| !h.is_empty()) else {
            return false;
        };
        let production = &self.cfg.production;
        if production.exclude.iter().any(|p| p.matches(host_name)) {
            return false;
        }
        production.include.iter().any(|p| p.matches(host_name))
    }

    /// Explicit IP membership, or range membership plus a master marker in the host name.
    pub fn is_master_database(&self, ip: Option<&str>, host_name: Option<&str>) -> bool {
        let Some(ip) = ip.map(str::trim).filter(|ip| !ip.is_empty()) else {
            return false;
        };
        let master_db = &self.cfg.master_db;
        if master_db.ips.contains(ip) {
            return true;
        }

        let Some(range) = &master_db.range else {
            return false;
        };
        if !in_range(ip, &range.start, &range.end) {
            return false;
        }

        let Some(host_name) = host_name else {
            return false;
        };
        let host_name = host_name.to_lowercase();
        master_db
            .name_markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .any(|marker| host_name.contains(marker.to_lowercase().as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::HostPattern;
    use crate::test_support::policy;

    #[test]
    fn ops_matches_roster_entry_inside_sheet_name() {
        let cfg = policy();
        let rules = PolicyRules::new(&cfg);
        assert!(rules.is_ops_personnel("张涛已授权主机"));
        assert!(rules.is_ops_personnel("运维-王鹏辉已授权主机"));
        assert!(!rules.is_ops_personnel("李四已授权主机"));
    }

    #[test]
    fn ops_matches_owner_prefix_inside_roster_entry() {
        let mut cfg = policy();
        cfg.ops_personnel = vec!["张涛(运维)".to_string()];
        let rules = PolicyRules::new(&cfg);
        assert!(rules.is_ops_personnel("张涛已授权主机"));
    }

    #[test]
    fn ops_never_matches_empty_names() {
        let mut cfg = policy();
        cfg.ops_personnel.push(String::new());
        let rules = PolicyRules::new(&cfg);
        assert!(!rules.is_ops_personnel(""));
        assert!(!rules.is_ops_personnel("   "));
        // Owner prefix is empty here; it must not match every roster entry.
        assert!(!rules.is_ops_personnel("已授权主机"));
    }

    #[test]
    fn owner_name_is_prefix_before_delimiter() {
        let cfg = policy();
        let rules = PolicyRules::new(&cfg);
        assert_eq!(rules.owner_name(" 李四 已授权主机"), "李四");
        assert_eq!(rules.owner_name("no delimiter"), "no delimiter");
    }

    #[test]
    fn production_requires_include_match() {
        let cfg = policy();
        let rules = PolicyRules::new(&cfg);
        assert!(rules.is_production_host(Some("crm-prd-01")));
        assert!(rules.is_production_host(Some("pehx-outpub-web")));
        assert!(!rules.is_production_host(Some("crm-dev-01")));
        assert!(!rules.is_production_host(None));
        assert!(!rules.is_production_host(Some("")));
    }

    #[test]
    fn production_exclude_wins_over_include() {
        let cfg = policy();
        let rules = PolicyRules::new(&cfg);
        assert!(!rules.is_production_host(Some("crm-prd-uat-01")));
    }

    #[test]
    fn production_regex_patterns() {
        let mut cfg = policy();
        cfg.production.include = vec![HostPattern::regex(r"^core-\d{2}$").expect("regex")];
        cfg.production.exclude = vec![HostPattern::regex("(?i)TEST").expect("regex")];
        let rules = PolicyRules::new(&cfg);
        assert!(rules.is_production_host(Some("core-07")));
        assert!(!rules.is_production_host(Some("core-7")));
        assert!(!rules.is_production_host(Some("core-test")));
    }

    #[test]
    fn master_db_by_explicit_ip() {
        let cfg = policy();
        let rules = PolicyRules::new(&cfg);
        assert!(rules.is_master_database(Some("192.168.240.181"), None));
        assert!(rules.is_master_database(Some(" 192.168.240.156 "), Some("anything")));
    }

    #[test]
    fn master_db_range_requires_name_marker() {
        let cfg = policy();
        let rules = PolicyRules::new(&cfg);
        assert!(rules.is_master_database(Some("192.168.240.160"), Some("order-MASTER-1")));
        assert!(rules.is_master_database(Some("192.168.240.160"), Some("MainDB-order")));
        assert!(!rules.is_master_database(Some("192.168.240.160"), Some("order-slave-1")));
        assert!(!rules.is_master_database(Some("192.168.240.160"), None));
        assert!(!rules.is_master_database(Some("192.168.241.160"), Some("order-master")));
    }

    #[test]
    fn master_db_ignores_malformed_ip() {
        let cfg = policy();
        let rules = PolicyRules::new(&cfg);
        assert!(!rules.is_master_database(Some("192.168.240"), Some("master")));
        assert!(!rules.is_master_database(None, Some("master")));
    }
}
