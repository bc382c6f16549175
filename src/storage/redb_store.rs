// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded document store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `banks`, `customers`, `accounts`, `balances`, `consents`:
//!   id → JSON document
//! - `transactions`: `account_id|tx_id` → JSON document
//! - `consent_audit`: `consent_id|timestamp_micros|event_id` → JSON event
//!
//! Ids used as key segments may not contain `|`; writes reject them with
//! `StorageError::InvalidId`.
//!
//! Conditional consent updates read and write inside one write
//! transaction; redb serializes write transactions, so the status check
//! and the write cannot interleave with another writer.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};

use crate::models::{Account, Balance, Bank, Consent, ConsentStatus, Customer, Transaction};

use super::{
    check_id, AuditEvent, ConsentPatch, Storage, StorageError, StorageResult, ID_SEPARATOR,
};

// =============================================================================
// Table Definitions
// =============================================================================

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

const BANKS: JsonTable = TableDefinition::new("banks");
const CUSTOMERS: JsonTable = TableDefinition::new("customers");
const ACCOUNTS: JsonTable = TableDefinition::new("accounts");
const BALANCES: JsonTable = TableDefinition::new("balances");
const CONSENTS: JsonTable = TableDefinition::new("consents");

/// `account_id|tx_id` → transaction.
const TRANSACTIONS: JsonTable = TableDefinition::new("transactions");

/// `consent_id|timestamp_micros|event_id` → audit event.
const CONSENT_AUDIT: JsonTable = TableDefinition::new("consent_audit");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RedbError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] StorageError),
}

impl From<RedbError> for StorageError {
    fn from(e: RedbError) -> Self {
        match e {
            RedbError::Domain(inner) => inner,
            RedbError::Serde(inner) => StorageError::Serialization(inner),
            other => StorageError::Backend(other.to_string()),
        }
    }
}

type RedbResult<T> = Result<T, RedbError>;

// =============================================================================
// Key Helpers
// =============================================================================

fn child_key(parent_id: &str, child_id: &str) -> StorageResult<String> {
    Ok(format!(
        "{}{ID_SEPARATOR}{}",
        check_id(parent_id)?,
        check_id(child_id)?
    ))
}

/// Half-open range covering every `parent_id|...` key.
///
/// `}` sorts directly after `|`, so `parent_id}` bounds the prefix.
fn child_range(parent_id: &str) -> (String, String) {
    (format!("{parent_id}{ID_SEPARATOR}"), format!("{parent_id}}}"))
}

fn audit_key(event: &AuditEvent) -> StorageResult<String> {
    Ok(format!(
        "{}{ID_SEPARATOR}{:020}{ID_SEPARATOR}{}",
        check_id(&event.consent_id)?,
        event.timestamp.timestamp_micros(),
        event.event_id
    ))
}

// =============================================================================
// RedbStore
// =============================================================================

/// Embedded ACID document store.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::open_inner(path).map_err(StorageError::from)
    }

    fn open_inner(path: &Path) -> RedbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Backend(format!("create {}: {e}", parent.display())))?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            for table in [
                BANKS,
                CUSTOMERS,
                ACCOUNTS,
                BALANCES,
                CONSENTS,
                TRANSACTIONS,
                CONSENT_AUDIT,
            ] {
                let _ = write_txn.open_table(table)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn get_json<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> RedbResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> RedbResult<()> {
        let json = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn scan_json<T: DeserializeOwned>(&self, table: JsonTable, parent_id: &str) -> RedbResult<Vec<T>> {
        // No stored key has a parent segment containing the separator.
        if check_id(parent_id).is_err() {
            return Ok(Vec::new());
        }
        let (start, end) = child_range(parent_id);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;

        let mut items = Vec::new();
        for entry in table.range(start.as_str()..end.as_str())? {
            let (_, value) = entry?;
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }

    fn list_consents_inner(&self, bank_id: &str) -> RedbResult<Vec<Consent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONSENTS)?;

        let mut consents = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let consent: Consent = serde_json::from_slice(value.value())?;
            if consent.bank_id == bank_id {
                consents.push(consent);
            }
        }
        consents.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.consent_id.cmp(&b.consent_id))
        });
        Ok(consents)
    }

    fn insert_consent_inner(&self, consent: &Consent) -> RedbResult<()> {
        check_id(&consent.consent_id)?;
        let json = serde_json::to_vec(consent)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CONSENTS)?;
            if table.get(consent.consent_id.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Consent {}",
                    consent.consent_id
                ))
                .into());
            }
            table.insert(consent.consent_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Read-modify-write of one consent inside a single write transaction.
    ///
    /// `update` may reject the current record; nothing is written then.
    fn modify_consent<F>(&self, consent_id: &str, update: F) -> RedbResult<Consent>
    where
        F: FnOnce(&mut Consent) -> StorageResult<()>,
    {
        let write_txn = self.db.begin_write()?;
        let consent = {
            let mut table = write_txn.open_table(CONSENTS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = {
                let existing = table
                    .get(consent_id)?
                    .ok_or_else(|| StorageError::NotFound(format!("Consent {consent_id}")))?;
                existing.value().to_vec()
            };

            let mut consent: Consent = serde_json::from_slice(&existing_bytes)?;
            update(&mut consent)?;

            let json = serde_json::to_vec(&consent)?;
            table.insert(consent_id, json.as_slice())?;
            consent
        };
        write_txn.commit()?;
        Ok(consent)
    }

    fn health_check_inner(&self) -> RedbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(CONSENTS)?;
        Ok(())
    }
}

impl Storage for RedbStore {
    fn get_bank(&self, bank_id: &str) -> StorageResult<Option<Bank>> {
        Ok(self.get_json(BANKS, bank_id)?)
    }

    fn put_bank(&self, bank: &Bank) -> StorageResult<()> {
        Ok(self.put_json(BANKS, &bank.id, bank)?)
    }

    fn get_customer(&self, customer_id: &str) -> StorageResult<Option<Customer>> {
        Ok(self.get_json(CUSTOMERS, customer_id)?)
    }

    fn put_customer(&self, customer: &Customer) -> StorageResult<()> {
        Ok(self.put_json(CUSTOMERS, &customer.id, customer)?)
    }

    fn get_account(&self, account_id: &str) -> StorageResult<Option<Account>> {
        Ok(self.get_json(ACCOUNTS, account_id)?)
    }

    fn put_account(&self, account: &Account) -> StorageResult<()> {
        Ok(self.put_json(ACCOUNTS, check_id(&account.id)?, account)?)
    }

    fn get_balance(&self, account_id: &str) -> StorageResult<Option<Balance>> {
        Ok(self.get_json(BALANCES, account_id)?)
    }

    fn put_balance(&self, balance: &Balance) -> StorageResult<()> {
        Ok(self.put_json(BALANCES, &balance.account_id, balance)?)
    }

    fn list_transactions(&self, account_id: &str) -> StorageResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self.scan_json(TRANSACTIONS, account_id)?;
        transactions.sort_by_key(|tx| tx.timestamp);
        Ok(transactions)
    }

    fn put_transaction(&self, transaction: &Transaction) -> StorageResult<()> {
        let key = child_key(&transaction.account_id, &transaction.id)?;
        Ok(self.put_json(TRANSACTIONS, &key, transaction)?)
    }

    fn insert_consent(&self, consent: &Consent) -> StorageResult<()> {
        Ok(self.insert_consent_inner(consent)?)
    }

    fn get_consent(&self, consent_id: &str) -> StorageResult<Option<Consent>> {
        Ok(self.get_json(CONSENTS, consent_id)?)
    }

    fn list_consents(&self, bank_id: &str) -> StorageResult<Vec<Consent>> {
        Ok(self.list_consents_inner(bank_id)?)
    }

    fn patch_consent(&self, consent_id: &str, patch: &ConsentPatch) -> StorageResult<Consent> {
        Ok(self.modify_consent(consent_id, |consent| {
            patch.apply(consent);
            Ok(())
        })?)
    }

    fn compare_and_set_status(
        &self,
        consent_id: &str,
        expected: ConsentStatus,
        next: ConsentStatus,
    ) -> StorageResult<Consent> {
        Ok(self.modify_consent(consent_id, |consent| {
            if consent.status != expected {
                return Err(StorageError::StatusMismatch {
                    consent_id: consent_id.to_string(),
                    expected,
                    actual: consent.status,
                });
            }
            consent.status = next;
            Ok(())
        })?)
    }

    fn append_audit(&self, event: &AuditEvent) -> StorageResult<()> {
        Ok(self.put_json(CONSENT_AUDIT, &audit_key(event)?, event)?)
    }

    fn list_audit(&self, consent_id: &str) -> StorageResult<Vec<AuditEvent>> {
        Ok(self.scan_json(CONSENT_AUDIT, consent_id)?)
    }

    fn health_check(&self) -> StorageResult<()> {
        Ok(self.health_check_inner()?)
    }
}

// =============================================================================
// Tests
// =============================================================================
