//! Stable identifiers for reason codes and report schemas.
//!
//! Reason codes are short snake_case discriminators; they are the keys of
//! `CheckSummary::by_reason` and must never be renamed.

// Reasons
pub const REASON_LONG_STANDING_PRODUCTION: &str = "long_standing_production";
pub const REASON_LONG_STANDING_MASTER_DB: &str = "long_standing_master_db";
pub const REASON_DUPLICATE_GRANT: &str = "duplicate_grant";
