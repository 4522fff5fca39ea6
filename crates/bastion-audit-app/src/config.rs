//! Config loading shared by every use case that needs the effective policy.

use anyhow::Context;
use bastion_audit_settings::{AuditConfigV1, Overrides, ResolvedConfig};

pub const DEFAULT_CONFIG_FILE: &str = "bastion-audit.toml";
pub const DEFAULT_HISTORY_DIR: &str = ".bastion-audit/history";

/// Parse config text (empty means defaults) and resolve it over its preset.
pub fn load_config(config_text: &str, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let cfg = if config_text.trim().is_empty() {
        AuditConfigV1::default()
    } else {
        bastion_audit_settings::parse_config_toml(config_text).context("parse config")?
    };
    bastion_audit_settings::resolve_config(cfg, overrides).context("resolve config")
}
