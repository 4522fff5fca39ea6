//! Config parsing and preset resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::{
    AuditConfigV1, FieldsConfig, IpRangeConfig, MasterDbConfig, PatternConfig, ProductionConfig,
    SheetsConfig, TaggedPattern,
};
pub use presets::{PRESETS, preset};
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `bastion-audit.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<AuditConfigV1> {
    let cfg: AuditConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Render a config model back to TOML.
pub fn render_config_toml(cfg: &AuditConfigV1) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}

/// Resolve the effective policy used by the engine (preset + config + overrides).
pub fn resolve_config(cfg: AuditConfigV1, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
