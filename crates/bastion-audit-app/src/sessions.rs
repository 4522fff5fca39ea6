//! In-memory check results addressed by opaque tokens, for embedding behind a UI or server.
//!
//! [`run_check_session`] runs a check and hands back the token that later amendments use.

use crate::amend::{AmendError, update_record_flag};
use crate::check::{CheckInput, CheckOutput, run_check};
use bastion_audit_types::{CheckReport, CheckSummary};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Session {
    report: CheckReport,
    expires_at_ms: i64,
}

/// Completed checks kept for later flag amendment and export.
///
/// Sessions expire `ttl_ms` after they were created; expired sessions behave as unknown.
#[derive(Clone, Debug)]
pub struct CheckSessions {
    ttl_ms: i64,
    sessions: BTreeMap<String, Session>,
}

impl CheckSessions {
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            ttl_ms,
            sessions: BTreeMap::new(),
        }
    }

    /// Keep a report and return its token.
    pub fn insert(&mut self, report: CheckReport, now_ms: i64) -> String {
        self.purge_expired(now_ms);
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                report,
                expires_at_ms: now_ms.saturating_add(self.ttl_ms),
            },
        );
        token
    }

    pub fn get(&self, token: &str, now_ms: i64) -> Result<&CheckReport, AmendError> {
        match self.sessions.get(token) {
            Some(session) if session.expires_at_ms > now_ms => Ok(&session.report),
            _ => Err(expired(token)),
        }
    }

    pub fn update_record_flag(
        &mut self,
        token: &str,
        sheet: &str,
        index: usize,
        should_delete: bool,
        now_ms: i64,
    ) -> Result<CheckSummary, AmendError> {
        match self.sessions.get_mut(token) {
            Some(session) if session.expires_at_ms > now_ms => {
                update_record_flag(&mut session.report, sheet, index, should_delete)
            }
            _ => Err(expired(token)),
        }
    }

    /// Take a report out of the store.
    pub fn remove(&mut self, token: &str) -> Option<CheckReport> {
        self.sessions.remove(token).map(|s| s.report)
    }

    /// Drop expired sessions, returning how many were dropped.
    pub fn purge_expired(&mut self, now_ms: i64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at_ms > now_ms);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Run a check and keep its report in `sessions`, returning the issued token with the output.
///
/// The session clock is the check's clock, so the TTL starts when the check ran.
pub fn run_check_session(
    input: CheckInput<'_>,
    sessions: &mut CheckSessions,
) -> anyhow::Result<(String, CheckOutput)> {
    let now_ms = input.clock.now_ms();
    let output = run_check(input)?;
    let token = sessions.insert(output.report.clone(), now_ms);
    tracing::debug!(%token, "issued check session");
    Ok((token, output))
}

fn expired(token: &str) -> AmendError {
    AmendError::SessionExpired {
        token: token.to_string(),
    }
}
