//! Explain registry for reason codes.
//!
//! Maps reason codes to human-readable explanations with remediation guidance.

use crate::ids;

/// Explanation entry for a reason code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the reason.
    pub title: &'static str,
    /// What triggers the reason and why it exists.
    pub description: &'static str,
    /// How to resolve a flagged grant.
    pub remediation: &'static str,
}

/// Look up an explanation by reason code.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        ids::REASON_LONG_STANDING_PRODUCTION => Some(explain_long_standing_production()),
        ids::REASON_LONG_STANDING_MASTER_DB => Some(explain_long_standing_master_db()),
        ids::REASON_DUPLICATE_GRANT => Some(explain_duplicate_grant()),
        _ => None,
    }
}

/// List all known reason codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::REASON_LONG_STANDING_PRODUCTION,
        ids::REASON_LONG_STANDING_MASTER_DB,
        ids::REASON_DUPLICATE_GRANT,
    ]
}

fn explain_long_standing_production() -> Explanation {
    Explanation {
        title: "Long-standing production access",
        description: "\
A grant to a production host, held by someone outside the ops roster, was also
present in a snapshot of the same workbook taken at least `threshold_days` ago.

Production hosts are recognised by the `production.include` patterns, net of
`production.exclude` (an excluded host is never production). Grants only count
once the same permission (IP, host name, network, group, protocol, account) is
seen on both sides of the threshold window, so ad-hoc access is never flagged.",
        remediation: "\
Revoke the grant on the bastion host, or move the owner onto the ops roster if
standing production access is part of the role.",
    }
}

fn explain_long_standing_master_db() -> Explanation {
    Explanation {
        title: "Long-standing master database access",
        description: "\
A grant to a master database host, held by someone outside the ops roster, was
also present in a snapshot of the same workbook taken at least
`threshold_days` ago.

A host is a master database when its IP is listed in `master_db.ips`, or when
the IP falls inside `master_db.range` and the host name contains one of the
`master_db.name_markers` (case-insensitive).",
        remediation: "\
Revoke the grant, or replace it with replica/read-only access if the owner
only needs to query data.",
    }
}

fn explain_duplicate_grant() -> Explanation {
    Explanation {
        title: "Duplicate grant",
        description: "\
Another record earlier in the same sheet has the same duplicate key (by
default host IP, host name and login account). The first record is kept;
every later copy is flagged.",
        remediation: "\
Delete the redundant rows. The surviving first row carries the grant.",
    }
}
