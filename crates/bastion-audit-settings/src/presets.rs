use crate::model::{
    AuditConfigV1, FieldsConfig, IpRangeConfig, MasterDbConfig, PatternConfig, ProductionConfig,
    SheetsConfig,
};

/// Names accepted by [`preset`]; anything else falls back to `default`.
pub const PRESETS: &[&str] = &["default", "strict"];

/// Preset profiles are fully populated configs that user config is layered over.
///
/// Keep these small and readable. The ops roster is always empty here; it is
/// organisation data and belongs in repo config.
pub fn preset(profile: &str) -> AuditConfigV1 {
    match profile {
        "strict" => strict_profile(),
        _ => default_profile(),
    }
}

fn default_profile() -> AuditConfigV1 {
    AuditConfigV1 {
        schema: Some("bastion-audit.config.v1".to_string()),
        profile: Some("default".to_string()),
        threshold_days: Some(30),
        retention_max: Some(50),
        history_dir: None,
        ops_personnel: Some(Vec::new()),
        duplicate_key: Some(vec![
            "host_ip".to_string(),
            "host_name".to_string(),
            "account".to_string(),
        ]),
        production: Some(ProductionConfig {
            include: Some(vec![
                PatternConfig::Literal("prd".to_string()),
                PatternConfig::Literal("pehx-outpub-".to_string()),
            ]),
            exclude: Some(vec![PatternConfig::Literal("uat".to_string())]),
        }),
        master_db: Some(MasterDbConfig {
            ips: Some(vec![
                "192.168.240.181".to_string(),
                "192.168.240.156".to_string(),
            ]),
            range: Some(IpRangeConfig {
                start: "192.168.240.150".to_string(),
                end: "192.168.240.190".to_string(),
            }),
            name_markers: Some(vec!["maindb".to_string(), "master".to_string()]),
        }),
        fields: Some(FieldsConfig {
            host_ip: Some("主机IP".to_string()),
            host_name: Some("主机名称".to_string()),
            network: Some("主机网络".to_string()),
            host_group: Some("主机组".to_string()),
            protocol: Some("协议".to_string()),
            account: Some("账户登录名".to_string()),
            delete_marker: Some("删除标记".to_string()),
            delete_value: Some("删除".to_string()),
        }),
        sheets: Some(SheetsConfig {
            authorized: Some("已授权主机".to_string()),
            owner_delimiter: Some("已授权".to_string()),
        }),
    }
}

fn strict_profile() -> AuditConfigV1 {
    // Weekly review cadence: a shorter window needs more snapshots kept.
    AuditConfigV1 {
        profile: Some("strict".to_string()),
        threshold_days: Some(7),
        retention_max: Some(100),
        ..default_profile()
    }
}
