// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Consent state machine.
//!
//! | From                     | Action  | To           |
//! |--------------------------|---------|--------------|
//! | `AWAITING_AUTHORIZATION` | approve | `AUTHORIZED` |
//! | `AWAITING_AUTHORIZATION` | deny    | `REVOKED`    |
//! | `AUTHORIZED`/`REVOKED`   | any     | rejected     |
//!
//! `AUTHORIZED` and `REVOKED` are terminal for the customer's decision.
//! The raw update and revoke primitives of the engine sit outside this
//! table.

use std::fmt;
use std::str::FromStr;

use super::ConsentError;
use crate::models::ConsentStatus;

/// Customer decision submitted on the authorization page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationAction {
    Approve,
    Deny,
}

impl AuthorizationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationAction::Approve => "approve",
            AuthorizationAction::Deny => "deny",
        }
    }

    /// Status the consent ends up in after this action.
    pub fn target(&self) -> ConsentStatus {
        match self {
            AuthorizationAction::Approve => ConsentStatus::Authorized,
            AuthorizationAction::Deny => ConsentStatus::Revoked,
        }
    }
}

impl fmt::Display for AuthorizationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthorizationAction {
    type Err = ConsentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(AuthorizationAction::Approve),
            "deny" => Ok(AuthorizationAction::Deny),
            other => Err(ConsentError::BadRequest(format!(
                "invalid action '{other}', expected 'approve' or 'deny'"
            ))),
        }
    }
}

/// The status every customer decision must start from.
pub const AWAITING: ConsentStatus = ConsentStatus::AwaitingAuthorization;

pub fn is_terminal(status: ConsentStatus) -> bool {
    status != AWAITING
}

/// Apply `action` to a consent currently in `from`.
pub fn transition(
    from: ConsentStatus,
    action: AuthorizationAction,
) -> Result<ConsentStatus, ConsentError> {
    if is_terminal(from) {
        return Err(ConsentError::not_awaiting_authorization());
    }
    Ok(action.target())
}
