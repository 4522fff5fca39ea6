use regex::Regex;
use std::collections::BTreeSet;

/// A host-name pattern. Matching is case-sensitive for every kind.
#[derive(Clone, Debug)]
pub enum HostPattern {
    /// Substring match.
    Literal(String),
    Regex(Regex),
    Prefix(String),
    Suffix(String),
}

impl HostPattern {
    pub fn literal(text: impl Into<String>) -> Self {
        HostPattern::Literal(text.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(HostPattern::Regex)
    }

    pub fn matches(&self, host_name: &str) -> bool {
        match self {
            HostPattern::Literal(text) => host_name.contains(text.as_str()),
            HostPattern::Regex(re) => re.is_match(host_name),
            HostPattern::Prefix(text) => host_name.starts_with(text.as_str()),
            HostPattern::Suffix(text) => host_name.ends_with(text.as_str()),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProductionPolicy {
    pub include: Vec<HostPattern>,
    /// Any match here wins over `include`.
    pub exclude: Vec<HostPattern>,
}

/// Inclusive dotted-quad range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IpRange {
    pub start: String,
    pub end: String,
}

#[derive(Clone, Debug, Default)]
pub struct MasterDbPolicy {
    pub ips: BTreeSet<String>,
    pub range: Option<IpRange>,
    /// Lowercase markers; a ranged host must carry one in its name.
    pub name_markers: Vec<String>,
}

/// Column names of the source workbook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldMap {
    pub host_ip: String,
    pub host_name: String,
    pub network: String,
    pub host_group: String,
    pub protocol: String,
    pub account: String,
    pub delete_marker: String,
    /// Written into `delete_marker` for flagged records.
    pub delete_value: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            host_ip: "主机IP".to_string(),
            host_name: "主机名称".to_string(),
            network: "主机网络".to_string(),
            host_group: "主机组".to_string(),
            protocol: "协议".to_string(),
            account: "账户登录名".to_string(),
            delete_marker: "删除标记".to_string(),
            delete_value: "删除".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetMarkers {
    /// Sheets whose name contains this are evaluated; all others are passed through.
    pub authorized: String,
    /// The owner is the part of the sheet name before this delimiter.
    pub owner_delimiter: String,
}

impl Default for SheetMarkers {
    fn default() -> Self {
        Self {
            authorized: "已授权主机".to_string(),
            owner_delimiter: "已授权".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PolicyConfig {
    pub profile: String,
    pub ops_personnel: Vec<String>,
    pub production: ProductionPolicy,
    pub master_db: MasterDbPolicy,
    /// Columns forming the duplicate key, in order. Empty disables duplicate detection.
    pub duplicate_key: Vec<String>,
    pub threshold_days: u32,
    pub retention_max: usize,
    pub fields: FieldMap,
    pub sheets: SheetMarkers,
}

impl PolicyConfig {
    pub fn is_authorized_sheet(&self, sheet_name: &str) -> bool {
        sheet_name.contains(self.sheets.authorized.as_str())
    }
}
