// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Demo data for local runs (`SEED_DEMO_DATA=1`).
//!
//! Ids are fixed so that consent requests can be written by hand:
//!
//! | Customer | Accounts |
//! |----------|----------|
//! | `cust-001` John Doe | `acc-001` Main Checking, `acc-002` Vacation Savings |
//! | `cust-002` Jane Smith | `acc-003` Primary Account |

use chrono::{DateTime, Duration, Utc};

use crate::models::{
    Account, AccountStatus, AccountType, Balance, Bank, Customer, Transaction, TransactionStatus,
    TransactionType,
};
use crate::storage::{Storage, StorageResult};

/// What was written by [`seed_demo_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub bank_id: String,
    pub customer_ids: Vec<String>,
    pub account_ids: Vec<String>,
}

fn customer(id: &str, bank_id: &str, first: &str, last: &str, phone: &str) -> Customer {
    Customer {
        id: id.to_string(),
        bank_id: bank_id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        phone: Some(phone.to_string()),
    }
}

fn account(
    id: &str,
    customer_id: &str,
    bank_id: &str,
    account_type: AccountType,
    name: &str,
    now: DateTime<Utc>,
) -> Account {
    Account {
        id: id.to_string(),
        customer_id: customer_id.to_string(),
        bank_id: bank_id.to_string(),
        account_type,
        account_name: name.to_string(),
        currency: "USD".to_string(),
        status: AccountStatus::Active,
        created_at: now,
    }
}

fn balance(account_id: &str, amount: f64) -> Balance {
    Balance {
        account_id: account_id.to_string(),
        available: amount,
        current: amount,
        pending: 0.0,
        currency: "USD".to_string(),
    }
}

fn transaction(
    id: &str,
    account_id: &str,
    amount: f64,
    description: &str,
    days_ago: i64,
    now: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        account_id: account_id.to_string(),
        amount,
        description: description.to_string(),
        transaction_type: if amount < 0.0 {
            TransactionType::Debit
        } else {
            TransactionType::Credit
        },
        status: TransactionStatus::Completed,
        timestamp: now - Duration::days(days_ago),
    }
}

/// Write the demo bank, customers, accounts, balances and transactions.
///
/// Existing records with the same ids are overwritten; consents are left
/// alone.
pub fn seed_demo_data(
    storage: &dyn Storage,
    bank_id: &str,
    bank_name: &str,
) -> StorageResult<SeedSummary> {
    let now = Utc::now();

    storage.put_bank(&Bank {
        id: bank_id.to_string(),
        name: bank_name.to_string(),
    })?;

    let customers = [
        customer("cust-001", bank_id, "John", "Doe", "+1234567890"),
        customer("cust-002", bank_id, "Jane", "Smith", "+1987654321"),
    ];
    for c in &customers {
        storage.put_customer(c)?;
    }

    let accounts = [
        account("acc-001", "cust-001", bank_id, AccountType::Current, "Main Checking", now),
        account("acc-002", "cust-001", bank_id, AccountType::Savings, "Vacation Savings", now),
        account("acc-003", "cust-002", bank_id, AccountType::Current, "Primary Account", now),
    ];
    for a in &accounts {
        storage.put_account(a)?;
    }

    for b in [
        balance("acc-001", 5000.75),
        balance("acc-002", 12500.50),
        balance("acc-003", 7350.25),
    ] {
        storage.put_balance(&b)?;
    }

    for t in [
        transaction("tx-001", "acc-001", -25.50, "Coffee Shop", 1, now),
        transaction("tx-002", "acc-001", 1200.00, "Salary Deposit", 7, now),
        transaction("tx-003", "acc-002", 500.00, "Transfer from Checking", 14, now),
        transaction("tx-004", "acc-003", -120.30, "Grocery Store", 2, now),
        transaction("tx-005", "acc-003", -45.99, "Online Subscription", 5, now),
    ] {
        storage.put_transaction(&t)?;
    }

    Ok(SeedSummary {
        bank_id: bank_id.to_string(),
        customer_ids: customers.iter().map(|c| c.id.clone()).collect(),
        account_ids: accounts.iter().map(|a| a.id.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    #[test]
    fn seeds_linked_records() {
        let store = InMemoryStore::new();
        let summary = seed_demo_data(&store, "bank-001", "First National Bank").unwrap();

        assert_eq!(summary.customer_ids, vec!["cust-001", "cust-002"]);
        assert_eq!(summary.account_ids, vec!["acc-001", "acc-002", "acc-003"]);

        let john = store.get_customer("cust-001").unwrap().unwrap();
        assert_eq!(john.email, "john.doe@example.com");
        assert_eq!(john.bank_id, "bank-001");

        let savings = store.get_account("acc-002").unwrap().unwrap();
        assert_eq!(savings.customer_id, "cust-001");
        assert_eq!(savings.account_type, AccountType::Savings);

        assert_eq!(store.get_balance("acc-003").unwrap().unwrap().available, 7350.25);

        let history = store.list_transactions("acc-001").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].description, "Salary Deposit");
        assert_eq!(history[1].transaction_type, TransactionType::Debit);
    }

    #[test]
    fn seeding_twice_is_harmless() {
        let store = InMemoryStore::new();
        seed_demo_data(&store, "bank-001", "Bank").unwrap();
        seed_demo_data(&store, "bank-001", "Bank").unwrap();
        assert_eq!(store.list_transactions("acc-003").unwrap().len(), 2);
    }
}
