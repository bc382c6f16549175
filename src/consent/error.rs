// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Consent engine errors.

use crate::storage::StorageError;

/// Failure taxonomy shared by the consent engine, the authorization pages
/// and the access gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsentError {
    /// Malformed or missing input, illegal transition, unknown permission
    /// or action value.
    #[error("{0}")]
    BadRequest(String),

    /// Unknown id, or an id belonging to another bank.
    #[error("{0}")]
    NotFound(String),

    /// Authenticated but not entitled.
    #[error("{0}")]
    Forbidden(String),

    /// Cross-bank account reference.
    #[error("{0}")]
    Conflict(String),

    /// Storage unreachable, failed or timed out.
    #[error("{0}")]
    Unavailable(String),
}

impl ConsentError {
    pub fn not_awaiting_authorization() -> Self {
        ConsentError::BadRequest("consent is not awaiting authorization".to_string())
    }

    pub fn consent_not_found(consent_id: &str) -> Self {
        ConsentError::NotFound(format!("Consent {consent_id} not found"))
    }
}

impl From<StorageError> for ConsentError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => ConsentError::NotFound(format!("{what} not found")),
            StorageError::StatusMismatch { .. } => ConsentError::not_awaiting_authorization(),
            StorageError::InvalidId(id) => ConsentError::BadRequest(format!("invalid id {id:?}")),
            StorageError::AlreadyExists(what) => {
                ConsentError::Conflict(format!("{what} already exists"))
            }
            other => {
                tracing::error!(error = %other, "Storage operation failed");
                ConsentError::Unavailable("storage is unavailable".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConsentStatus;

    #[test]
    fn status_mismatch_maps_to_bad_request() {
        let err = ConsentError::from(StorageError::StatusMismatch {
            consent_id: "c-1".into(),
            expected: ConsentStatus::AwaitingAuthorization,
            actual: ConsentStatus::Authorized,
        });
        assert_eq!(err, ConsentError::not_awaiting_authorization());
    }

    #[test]
    fn invalid_id_is_bad_request() {
        let err = ConsentError::from(StorageError::InvalidId("a|b".into()));
        assert!(matches!(err, ConsentError::BadRequest(msg) if msg.contains("a|b")));
    }

    #[test]
    fn backend_failure_hides_details() {
        let err = ConsentError::from(StorageError::Backend("disk on fire".into()));
        assert_eq!(
            err,
            ConsentError::Unavailable("storage is unavailable".into())
        );
    }
}
