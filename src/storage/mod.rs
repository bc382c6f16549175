// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Pluggable persistence for banks, customers, accounts, balances,
//! transactions, consents and the consent audit trail.
//!
//! ## Backends
//!
//! - [`InMemoryStore`] - process-local maps, the default for development
//!   and tests
//! - [`RedbStore`] - embedded ACID document store (one table per
//!   collection, JSON values)
//!
//! The handle is constructed by the process entry point and injected
//! through [`crate::state::AppState`]; there is no global instance.
//!
//! ## Consent Writes
//!
//! Consents are only ever changed through [`Storage::patch_consent`] and
//! [`Storage::compare_and_set_status`]. Both apply the change atomically
//! against the current stored record, so a concurrent approve and deny
//! for the same consent cannot both succeed.

pub mod audit;
pub mod memory;
pub mod redb_store;

pub use audit::{AuditEvent, AuditEventType};
pub use memory::InMemoryStore;
pub use redb_store::{RedbError, RedbStore};

use crate::models::{
    Account, Balance, Bank, Consent, ConsentStatus, Customer, Permission, Transaction,
};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Entity not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Entity already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Conditional status update found a different status
    #[error("consent {consent_id} is {actual}, expected {expected}")]
    StatusMismatch {
        consent_id: String,
        expected: ConsentStatus,
        actual: ConsentStatus,
    },

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Id that cannot be stored (contains [`ID_SEPARATOR`])
    #[error("invalid id: {0:?}")]
    InvalidId(String),

    /// Backend failure (I/O, database engine)
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A writer panicked while holding the store lock
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Joins parent and child ids in composite keys; never valid inside an id.
pub const ID_SEPARATOR: char = '|';

/// Reject ids that would be ambiguous inside a composite key.
pub fn check_id(id: &str) -> StorageResult<&str> {
    if id.is_empty() || id.contains(ID_SEPARATOR) {
        return Err(StorageError::InvalidId(id.to_string()));
    }
    Ok(id)
}

/// Field-level change applied to a stored consent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsentPatch {
    pub permissions: Option<Vec<Permission>>,
    pub status: Option<ConsentStatus>,
}

impl ConsentPatch {
    pub fn status(status: ConsentStatus) -> Self {
        Self {
            permissions: None,
            status: Some(status),
        }
    }

    /// Apply onto a record, leaving every other field untouched.
    pub fn apply(&self, consent: &mut Consent) {
        if let Some(permissions) = &self.permissions {
            consent.permissions = permissions.clone();
        }
        if let Some(status) = self.status {
            consent.status = status;
        }
    }
}

/// Storage adapter used by the consent engine and the resource handlers.
///
/// Implementations are synchronous; callers run them on the blocking pool.
/// Lookups return `Ok(None)` for unknown ids. Writes of accounts,
/// transactions and consents fail with `InvalidId` for ids rejected by
/// [`check_id`].
pub trait Storage: Send + Sync {
    // Banks
    fn get_bank(&self, bank_id: &str) -> StorageResult<Option<Bank>>;
    fn put_bank(&self, bank: &Bank) -> StorageResult<()>;

    // Customers
    fn get_customer(&self, customer_id: &str) -> StorageResult<Option<Customer>>;
    fn put_customer(&self, customer: &Customer) -> StorageResult<()>;

    // Accounts
    fn get_account(&self, account_id: &str) -> StorageResult<Option<Account>>;
    fn put_account(&self, account: &Account) -> StorageResult<()>;

    // Balances
    fn get_balance(&self, account_id: &str) -> StorageResult<Option<Balance>>;
    fn put_balance(&self, balance: &Balance) -> StorageResult<()>;

    // Transactions
    /// Transactions of an account, oldest first.
    fn list_transactions(&self, account_id: &str) -> StorageResult<Vec<Transaction>>;
    fn put_transaction(&self, transaction: &Transaction) -> StorageResult<()>;

    // Consents
    /// Insert a new consent; fails with `AlreadyExists` on id reuse.
    fn insert_consent(&self, consent: &Consent) -> StorageResult<()>;
    fn get_consent(&self, consent_id: &str) -> StorageResult<Option<Consent>>;
    /// All consents of a bank, oldest first.
    fn list_consents(&self, bank_id: &str) -> StorageResult<Vec<Consent>>;
    /// Atomically apply a patch and return the stored result.
    fn patch_consent(&self, consent_id: &str, patch: &ConsentPatch) -> StorageResult<Consent>;
    /// Set `next` only if the stored status is still `expected`.
    fn compare_and_set_status(
        &self,
        consent_id: &str,
        expected: ConsentStatus,
        next: ConsentStatus,
    ) -> StorageResult<Consent>;

    // Audit
    fn append_audit(&self, event: &AuditEvent) -> StorageResult<()>;
    /// Audit events of one consent, oldest first.
    fn list_audit(&self, consent_id: &str) -> StorageResult<Vec<AuditEvent>>;

    /// Cheap liveness probe of the backend.
    fn health_check(&self) -> StorageResult<()>;
}
