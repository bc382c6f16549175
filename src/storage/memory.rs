// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory storage backend.
//!
//! All collections live behind a single `RwLock`, so every conditional
//! update observes and writes the record under the same write guard.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{Account, Balance, Bank, Consent, ConsentStatus, Customer, Transaction};

use super::{check_id, AuditEvent, ConsentPatch, Storage, StorageError, StorageResult};

#[derive(Default)]
struct Collections {
    banks: HashMap<String, Bank>,
    customers: HashMap<String, Customer>,
    accounts: HashMap<String, Account>,
    balances: HashMap<String, Balance>,
    transactions: HashMap<String, Vec<Transaction>>,
    consents: HashMap<String, Consent>,
    audit: Vec<AuditEvent>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Collections>> {
        self.inner.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Collections>> {
        self.inner.write().map_err(|_| StorageError::Poisoned)
    }
}

impl Storage for InMemoryStore {
    fn get_bank(&self, bank_id: &str) -> StorageResult<Option<Bank>> {
        Ok(self.read()?.banks.get(bank_id).cloned())
    }

    fn put_bank(&self, bank: &Bank) -> StorageResult<()> {
        self.write()?.banks.insert(bank.id.clone(), bank.clone());
        Ok(())
    }

    fn get_customer(&self, customer_id: &str) -> StorageResult<Option<Customer>> {
        Ok(self.read()?.customers.get(customer_id).cloned())
    }

    fn put_customer(&self, customer: &Customer) -> StorageResult<()> {
        self.write()?
            .customers
            .insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    fn get_account(&self, account_id: &str) -> StorageResult<Option<Account>> {
        Ok(self.read()?.accounts.get(account_id).cloned())
    }

    fn put_account(&self, account: &Account) -> StorageResult<()> {
        check_id(&account.id)?;
        self.write()?
            .accounts
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    fn get_balance(&self, account_id: &str) -> StorageResult<Option<Balance>> {
        Ok(self.read()?.balances.get(account_id).cloned())
    }

    fn put_balance(&self, balance: &Balance) -> StorageResult<()> {
        self.write()?
            .balances
            .insert(balance.account_id.clone(), balance.clone());
        Ok(())
    }

    fn list_transactions(&self, account_id: &str) -> StorageResult<Vec<Transaction>> {
        let mut transactions = self
            .read()?
            .transactions
            .get(account_id)
            .cloned()
            .unwrap_or_default();
        transactions.sort_by_key(|tx| tx.timestamp);
        Ok(transactions)
    }

    fn put_transaction(&self, transaction: &Transaction) -> StorageResult<()> {
        check_id(&transaction.account_id)?;
        check_id(&transaction.id)?;
        let mut collections = self.write()?;
        let entries = collections
            .transactions
            .entry(transaction.account_id.clone())
            .or_default();
        match entries.iter_mut().find(|tx| tx.id == transaction.id) {
            Some(existing) => *existing = transaction.clone(),
            None => entries.push(transaction.clone()),
        }
        Ok(())
    }

    fn insert_consent(&self, consent: &Consent) -> StorageResult<()> {
        check_id(&consent.consent_id)?;
        let mut collections = self.write()?;
        if collections.consents.contains_key(&consent.consent_id) {
            return Err(StorageError::AlreadyExists(format!(
                "Consent {}",
                consent.consent_id
            )));
        }
        collections
            .consents
            .insert(consent.consent_id.clone(), consent.clone());
        Ok(())
    }

    fn get_consent(&self, consent_id: &str) -> StorageResult<Option<Consent>> {
        Ok(self.read()?.consents.get(consent_id).cloned())
    }

    fn list_consents(&self, bank_id: &str) -> StorageResult<Vec<Consent>> {
        let mut consents: Vec<Consent> = self
            .read()?
            .consents
            .values()
            .filter(|consent| consent.bank_id == bank_id)
            .cloned()
            .collect();
        consents.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.consent_id.cmp(&b.consent_id))
        });
        Ok(consents)
    }

    fn patch_consent(&self, consent_id: &str, patch: &ConsentPatch) -> StorageResult<Consent> {
        let mut collections = self.write()?;
        let Some(consent) = collections.consents.get_mut(consent_id) else {
            return Err(StorageError::NotFound(format!("Consent {consent_id}")));
        };
        patch.apply(consent);
        Ok(consent.clone())
    }

    fn compare_and_set_status(
        &self,
        consent_id: &str,
        expected: ConsentStatus,
        next: ConsentStatus,
    ) -> StorageResult<Consent> {
        let mut collections = self.write()?;
        let Some(consent) = collections.consents.get_mut(consent_id) else {
            return Err(StorageError::NotFound(format!("Consent {consent_id}")));
        };
        if consent.status != expected {
            return Err(StorageError::StatusMismatch {
                consent_id: consent_id.to_string(),
                expected,
                actual: consent.status,
            });
        }
        consent.status = next;
        Ok(consent.clone())
    }

    fn append_audit(&self, event: &AuditEvent) -> StorageResult<()> {
        self.write()?.audit.push(event.clone());
        Ok(())
    }

    fn list_audit(&self, consent_id: &str) -> StorageResult<Vec<AuditEvent>> {
        Ok(self
            .read()?
            .audit
            .iter()
            .filter(|event| event.consent_id == consent_id)
            .cloned()
            .collect())
    }

    fn health_check(&self) -> StorageResult<()> {
        self.read().map(|_| ())
    }
}
