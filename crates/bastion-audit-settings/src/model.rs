use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `bastion-audit.toml` schema v1.
///
/// This is a *user-facing* config model: every field is optional and layered over a preset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuditConfigV1 {
    /// Optional schema string for tooling (`bastion-audit.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Preset to start from: `default` or `strict`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Days a sensitive grant must persist before it is flagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_days: Option<u32>,

    /// Maximum number of snapshots kept across all source files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_max: Option<u32>,

    /// Directory holding the history index and stored snapshot copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_dir: Option<String>,

    /// Ops roster. Replaces the preset roster when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops_personnel: Option<Vec<String>>,

    /// Columns forming the duplicate key, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_key: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<ProductionConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_db: Option<MasterDbConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets: Option<SheetsConfig>,
}

/// A host pattern: a bare string is a substring match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PatternConfig {
    Literal(String),
    Tagged(TaggedPattern),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaggedPattern {
    Literal { text: String },
    Regex { pattern: String },
    Prefix { text: String },
    Suffix { text: String },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<PatternConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<PatternConfig>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MasterDbConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<String>>,
    /// Host-name markers required for a range match (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_markers: Option<Vec<String>>,
    /// Inclusive range; a match also needs a name marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<IpRangeConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IpRangeConfig {
    pub start: String,
    pub end: String,
}

/// Column names of the source workbook.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_value: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SheetsConfig {
    /// Only sheets whose name contains this marker are evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized: Option<String>,
    /// Owner identity is the sheet-name prefix before this delimiter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_delimiter: Option<String>,
}
