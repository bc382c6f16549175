// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only account data served under an authorized consent.
//!
//! These reads go through the same blocking-pool and timeout path as the
//! consent operations, but callers never see the storage adapter.

use super::{ConsentError, ConsentService};
use crate::models::{Account, Balance, Consent, Transaction};

fn account_not_found(account_id: &str) -> ConsentError {
    ConsentError::NotFound(format!("Account with ID {account_id} does not exist"))
}

impl ConsentService {
    /// Accounts listed on `consent`, in consent order. Ids that no longer
    /// resolve are skipped.
    pub async fn consented_accounts(&self, consent: &Consent) -> Result<Vec<Account>, ConsentError> {
        let account_ids = consent.account_ids.clone();
        self.with_storage("list_consent_accounts", move |storage| {
            let mut accounts = Vec::with_capacity(account_ids.len());
            for id in &account_ids {
                if let Some(account) = storage.get_account(id)? {
                    accounts.push(account);
                }
            }
            Ok(accounts)
        })
        .await
    }

    pub async fn account(&self, account_id: &str) -> Result<Account, ConsentError> {
        let account_id = account_id.to_string();
        self.with_storage("get_account", move |storage| {
            storage
                .get_account(&account_id)?
                .ok_or_else(|| account_not_found(&account_id))
        })
        .await
    }

    pub async fn balance(&self, account_id: &str) -> Result<Balance, ConsentError> {
        let account_id = account_id.to_string();
        self.with_storage("get_balance", move |storage| {
            storage.get_balance(&account_id)?.ok_or_else(|| {
                ConsentError::NotFound(format!("No balance for account {account_id}"))
            })
        })
        .await
    }

    /// Transactions of an existing account, oldest first.
    pub async fn transactions(&self, account_id: &str) -> Result<Vec<Transaction>, ConsentError> {
        let account_id = account_id.to_string();
        self.with_storage("list_transactions", move |storage| {
            if storage.get_account(&account_id)?.is_none() {
                return Err(account_not_found(&account_id));
            }
            Ok(storage.list_transactions(&account_id)?)
        })
        .await
    }

    /// Backend liveness, bounded by the storage timeout.
    pub async fn storage_health(&self) -> Result<(), ConsentError> {
        self.with_storage("health_check", |storage| Ok(storage.health_check()?))
            .await
    }
}
