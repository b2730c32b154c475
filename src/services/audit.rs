use chrono::{DateTime, Utc};

use crate::auth::AuthUser;

/// Who wrote a row and when, captured once per mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    pub at: DateTime<Utc>,
    pub by: String,
}

impl AuditStamp {
    /// Stamp for `actor` at the current instant
    pub fn now(actor: &AuthUser) -> Self {
        Self::at(actor, Utc::now())
    }

    pub fn at(actor: &AuthUser, at: DateTime<Utc>) -> Self {
        Self {
            at,
            by: actor.name.clone(),
        }
    }
}
