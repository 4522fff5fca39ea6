use crate::model::{
    AuditConfigV1, FieldsConfig, MasterDbConfig, PatternConfig, ProductionConfig, SheetsConfig,
    TaggedPattern,
};
use crate::presets;
use anyhow::Context;
use bastion_audit_domain::checks::ip_to_u32;
use bastion_audit_domain::policy::{
    FieldMap, HostPattern, IpRange, MasterDbPolicy, PolicyConfig, ProductionPolicy, SheetMarkers,
};

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub threshold_days: Option<u32>,
    pub retention_max: Option<u32>,
    pub history_dir: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: PolicyConfig,
    /// Configured history directory; callers pick a default when absent.
    pub history_dir: Option<String>,
}

pub fn resolve_config(cfg: AuditConfigV1, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "default".to_string());
    if !presets::PRESETS.contains(&profile.as_str()) {
        anyhow::bail!(
            "unknown profile: {profile} (expected one of {})",
            presets::PRESETS.join(", ")
        );
    }

    let merged = merge(presets::preset(&profile), cfg);

    let threshold_days = overrides
        .threshold_days
        .or(merged.threshold_days)
        .unwrap_or(30);
    if threshold_days == 0 {
        anyhow::bail!("threshold_days must be at least 1");
    }
    let retention_max = overrides.retention_max.or(merged.retention_max).unwrap_or(50);
    if retention_max == 0 {
        anyhow::bail!("retention_max must be at least 1");
    }

    let fields = resolve_fields(merged.fields.unwrap_or_default());
    let production = merged.production.unwrap_or_default();
    let effective = PolicyConfig {
        profile,
        ops_personnel: merged
            .ops_personnel
            .unwrap_or_default()
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect(),
        production: ProductionPolicy {
            include: resolve_patterns("production.include", production.include)?,
            exclude: resolve_patterns("production.exclude", production.exclude)?,
        },
        master_db: resolve_master_db(merged.master_db.unwrap_or_default())?,
        duplicate_key: merged
            .duplicate_key
            .unwrap_or_default()
            .iter()
            .map(|entry| column_for(entry, &fields))
            .collect(),
        threshold_days,
        retention_max: retention_max as usize,
        sheets: resolve_sheets(merged.sheets.unwrap_or_default()),
        fields,
    };

    Ok(ResolvedConfig {
        effective,
        history_dir: overrides.history_dir.or(merged.history_dir),
    })
}

/// Field-wise `user.or(preset)`; nested sections merge per field.
fn merge(preset: AuditConfigV1, user: AuditConfigV1) -> AuditConfigV1 {
    AuditConfigV1 {
        schema: user.schema.or(preset.schema),
        profile: user.profile.or(preset.profile),
        threshold_days: user.threshold_days.or(preset.threshold_days),
        retention_max: user.retention_max.or(preset.retention_max),
        history_dir: user.history_dir.or(preset.history_dir),
        ops_personnel: user.ops_personnel.or(preset.ops_personnel),
        duplicate_key: user.duplicate_key.or(preset.duplicate_key),
        production: merge_section(preset.production, user.production, |p, u| ProductionConfig {
            include: u.include.or(p.include),
            exclude: u.exclude.or(p.exclude),
        }),
        master_db: merge_section(preset.master_db, user.master_db, |p, u| MasterDbConfig {
            ips: u.ips.or(p.ips),
            range: u.range.or(p.range),
            name_markers: u.name_markers.or(p.name_markers),
        }),
        fields: merge_section(preset.fields, user.fields, |p, u| FieldsConfig {
            host_ip: u.host_ip.or(p.host_ip),
            host_name: u.host_name.or(p.host_name),
            network: u.network.or(p.network),
            host_group: u.host_group.or(p.host_group),
            protocol: u.protocol.or(p.protocol),
            account: u.account.or(p.account),
            delete_marker: u.delete_marker.or(p.delete_marker),
            delete_value: u.delete_value.or(p.delete_value),
        }),
        sheets: merge_section(preset.sheets, user.sheets, |p, u| SheetsConfig {
            authorized: u.authorized.or(p.authorized),
            owner_delimiter: u.owner_delimiter.or(p.owner_delimiter),
        }),
    }
}

fn merge_section<T>(preset: Option<T>, user: Option<T>, f: impl FnOnce(T, T) -> T) -> Option<T> {
    match (preset, user) {
        (Some(p), Some(u)) => Some(f(p, u)),
        (p, u) => u.or(p),
    }
}

fn resolve_patterns(
    section: &str,
    patterns: Option<Vec<PatternConfig>>,
) -> anyhow::Result<Vec<HostPattern>> {
    patterns
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !matches!(p, PatternConfig::Literal(text) if text.is_empty()))
        .map(|p| match p {
            PatternConfig::Literal(text) | PatternConfig::Tagged(TaggedPattern::Literal { text }) => {
                Ok(HostPattern::Literal(text))
            }
            PatternConfig::Tagged(TaggedPattern::Prefix { text }) => Ok(HostPattern::Prefix(text)),
            PatternConfig::Tagged(TaggedPattern::Suffix { text }) => Ok(HostPattern::Suffix(text)),
            PatternConfig::Tagged(TaggedPattern::Regex { pattern }) => HostPattern::regex(&pattern)
                .with_context(|| format!("invalid regex in {section}: {pattern}")),
        })
        .collect()
}

fn resolve_master_db(cfg: MasterDbConfig) -> anyhow::Result<MasterDbPolicy> {
    let mut ips = std::collections::BTreeSet::new();
    for ip in cfg.ips.unwrap_or_default() {
        let ip = ip.trim().to_string();
        validate_ip("master_db.ips", &ip)?;
        ips.insert(ip);
    }

    let range = match cfg.range {
        Some(range) => {
            let start = range.start.trim().to_string();
            let end = range.end.trim().to_string();
            let lo = validate_ip("master_db.range.start", &start)?;
            let hi = validate_ip("master_db.range.end", &end)?;
            if lo > hi {
                anyhow::bail!("master_db.range is empty: {start} > {end}");
            }
            Some(IpRange { start, end })
        }
        None => None,
    };

    Ok(MasterDbPolicy {
        ips,
        range,
        name_markers: cfg
            .name_markers
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect(),
    })
}

fn validate_ip(section: &str, ip: &str) -> anyhow::Result<u32> {
    ip_to_u32(ip).with_context(|| format!("invalid IPv4 address in {section}: {ip:?}"))
}

fn resolve_fields(cfg: FieldsConfig) -> FieldMap {
    let defaults = FieldMap::default();
    FieldMap {
        host_ip: cfg.host_ip.unwrap_or(defaults.host_ip),
        host_name: cfg.host_name.unwrap_or(defaults.host_name),
        network: cfg.network.unwrap_or(defaults.network),
        host_group: cfg.host_group.unwrap_or(defaults.host_group),
        protocol: cfg.protocol.unwrap_or(defaults.protocol),
        account: cfg.account.unwrap_or(defaults.account),
        delete_marker: cfg.delete_marker.unwrap_or(defaults.delete_marker),
        delete_value: cfg.delete_value.unwrap_or(defaults.delete_value),
    }
}

fn resolve_sheets(cfg: SheetsConfig) -> SheetMarkers {
    let defaults = SheetMarkers::default();
    SheetMarkers {
        authorized: cfg.authorized.unwrap_or(defaults.authorized),
        owner_delimiter: cfg.owner_delimiter.unwrap_or(defaults.owner_delimiter),
    }
}

/// Duplicate-key entries may name a field role (`host_ip`, `account`, ...) or a raw column.
fn column_for(entry: &str, fields: &FieldMap) -> String {
    match entry {
        "host_ip" => fields.host_ip.clone(),
        "host_name" => fields.host_name.clone(),
        "network" => fields.network.clone(),
        "host_group" => fields.host_group.clone(),
        "protocol" => fields.protocol.clone(),
        "account" => fields.account.clone(),
        column => column.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_toml;

    fn resolve(text: &str) -> anyhow::Result<ResolvedConfig> {
        resolve_config(parse_config_toml(text)?, Overrides::default())
    }

    #[test]
    fn empty_config_uses_default_preset() {
        let resolved = resolve("").expect("resolve");
        let cfg = resolved.effective;
        assert_eq!(cfg.profile, "default");
        assert_eq!(cfg.threshold_days, 30);
        assert_eq!(cfg.retention_max, 50);
        assert!(cfg.ops_personnel.is_empty());
        assert_eq!(cfg.production.include.len(), 2);
        assert_eq!(cfg.production.exclude.len(), 1);
        assert_eq!(cfg.master_db.ips.len(), 2);
        assert_eq!(
            cfg.duplicate_key,
            vec!["主机IP".to_string(), "主机名称".to_string(), "账户登录名".to_string()]
        );
        assert!(resolved.history_dir.is_none());
    }

    #[test]
    fn strict_profile_shortens_window() {
        let cfg = resolve("profile = \"strict\"").expect("resolve").effective;
        assert_eq!(cfg.threshold_days, 7);
        assert_eq!(cfg.retention_max, 100);
    }

    #[test]
    fn overrides_win_over_config() {
        let cfg = parse_config_toml("threshold_days = 14\nhistory_dir = \"h\"").expect("parse");
        let resolved = resolve_config(
            cfg,
            Overrides {
                threshold_days: Some(3),
                history_dir: Some("elsewhere".to_string()),
                ..Overrides::default()
            },
        )
        .expect("resolve");
        assert_eq!(resolved.effective.threshold_days, 3);
        assert_eq!(resolved.history_dir.as_deref(), Some("elsewhere"));
    }

    #[test]
    fn tagged_and_bare_patterns_resolve() {
        let cfg = resolve(
            r#"
[production]
include = ["prd", { kind = "regex", pattern = "^core-\\d+$" }, { kind = "prefix", text = "pehx-" }]
exclude = [{ kind = "suffix", text = "-uat" }]
"#,
        )
        .expect("resolve")
        .effective;
        assert_eq!(cfg.production.include.len(), 3);
        assert!(matches!(cfg.production.include[1], HostPattern::Regex(_)));
        assert!(matches!(cfg.production.include[2], HostPattern::Prefix(_)));
        assert!(matches!(cfg.production.exclude[0], HostPattern::Suffix(_)));
        // Untouched sections keep preset values.
        assert_eq!(cfg.master_db.name_markers, vec!["maindb", "master"]);
    }

    #[test]
    fn invalid_regex_is_reported_with_section() {
        let err = resolve(
            r#"
[production]
include = [{ kind = "regex", pattern = "(" }]
"#,
        )
        .expect_err("invalid regex");
        assert!(format!("{err:#}").contains("production.include"));
    }

    #[test]
    fn invalid_master_ips_are_rejected() {
        assert!(resolve("[master_db]\nips = [\"10.0.0.300\"]").is_err());
        assert!(
            resolve("[master_db]\nrange = { start = \"10.0.0.9\", end = \"10.0.0.1\" }").is_err()
        );
    }

    #[test]
    fn zero_threshold_or_retention_is_rejected() {
        assert!(resolve("threshold_days = 0").is_err());
        assert!(resolve("retention_max = 0").is_err());
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(resolve("profile = \"lenient\"").is_err());
    }

    #[test]
    fn renamed_columns_flow_into_duplicate_key() {
        let cfg = resolve(
            r#"
duplicate_key = ["host_ip", "protocol", "备注"]

[fields]
host_ip = "IP"
"#,
        )
        .expect("resolve")
        .effective;
        assert_eq!(cfg.fields.host_ip, "IP");
        assert_eq!(cfg.duplicate_key, vec!["IP", "协议", "备注"]);
    }

    #[test]
    fn roster_entries_are_trimmed() {
        let cfg = resolve("ops_personnel = [\" 张涛 \", \"\"]").expect("resolve").effective;
        assert_eq!(cfg.ops_personnel, vec!["张涛".to_string()]);
    }

    #[test]
    fn preset_renders_and_parses_back() {
        let text = crate::render_config_toml(&presets::preset("default")).expect("render");
        let parsed = parse_config_toml(&text).expect("parse");
        assert_eq!(parsed, presets::preset("default"));
    }
}
