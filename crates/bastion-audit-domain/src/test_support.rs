use crate::model::{Record, Sheet};
use crate::policy::{
    FieldMap, HostPattern, IpRange, MasterDbPolicy, PolicyConfig, ProductionPolicy, SheetMarkers,
};
use serde_json::json;

/// Policy mirroring the shipped default preset.
pub fn policy() -> PolicyConfig {
    let fields = FieldMap::default();
    PolicyConfig {
        profile: "test".to_string(),
        ops_personnel: ["王礼鑫", "王鹏辉", "杨志智", "张涛"]
            .into_iter()
            .map(String::from)
            .collect(),
        production: ProductionPolicy {
            include: vec![HostPattern::literal("prd"), HostPattern::literal("pehx-outpub-")],
            exclude: vec![HostPattern::literal("uat")],
        },
        master_db: MasterDbPolicy {
            ips: ["192.168.240.181", "192.168.240.156"]
                .into_iter()
                .map(String::from)
                .collect(),
            range: Some(IpRange {
                start: "192.168.240.150".to_string(),
                end: "192.168.240.190".to_string(),
            }),
            name_markers: vec!["maindb".to_string(), "master".to_string()],
        },
        duplicate_key: vec![
            fields.host_ip.clone(),
            fields.host_name.clone(),
            fields.account.clone(),
        ],
        threshold_days: 30,
        retention_max: 50,
        fields,
        sheets: SheetMarkers::default(),
    }
}

pub fn grant(ip: &str, host: &str, account: &str) -> Record {
    let fields = FieldMap::default();
    Record::from_fields([
        (fields.host_ip, json!(ip)),
        (fields.host_name, json!(host)),
        (fields.network, json!("core")),
        (fields.host_group, json!("default")),
        (fields.protocol, json!("SSH")),
        (fields.account, json!(account)),
    ])
}

pub fn sheet(name: &str, records: Vec<Record>) -> Sheet {
    Sheet {
        name: name.to_string(),
        records,
    }
}
