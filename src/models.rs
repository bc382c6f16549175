// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the records held by the storage layer and the
//! request and response structures used by the REST API. All types derive
//! `Serialize`, `Deserialize`, and `ToSchema` for automatic JSON handling
//! and OpenAPI documentation.
//!
//! Field names are snake_case in Rust and camelCase on the wire. Request
//! bodies additionally accept the snake_case spelling used by older
//! clients of the banking simulator.
//!
//! ## Model Categories
//!
//! - **Banking records**: banks, customers, accounts, balances and
//!   transactions (plain data, no lifecycle)
//! - **Consents**: the scoped, time-bounded grant a customer gives a TPP
//! - **Requests**: bodies accepted by the consent endpoints

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// =============================================================================
// Banking Records
// =============================================================================

/// A bank hosted by this simulator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub id: String,
    pub name: String,
}

/// A bank customer (the PSU in consent terms).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    /// The bank this customer belongs to.
    pub bank_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Current,
    Savings,
    CreditCard,
    Loan,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Inactive,
    Blocked,
}

/// A customer account held at a bank.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    /// Owning customer.
    pub customer_id: String,
    /// Bank holding the account.
    pub bank_id: String,
    pub account_type: AccountType,
    pub account_name: String,
    /// ISO 4217 currency code.
    pub currency: String,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

/// Current balance figures of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub account_id: String,
    pub available: f64,
    pub current: f64,
    pub pending: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Reversed,
}

/// A booked or pending movement on an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub amount: f64,
    pub description: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Consent Models
// =============================================================================

/// Data category a consent may grant access to.
///
/// The legacy scope strings (`balances:read`, ...) are accepted on input.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    #[serde(alias = "account:details:read")]
    AccountDetails,
    #[serde(alias = "transactions:read")]
    Transactions,
    #[serde(alias = "balances:read")]
    Balance,
}

impl Permission {
    pub const ALL: [Permission; 3] = [
        Permission::AccountDetails,
        Permission::Transactions,
        Permission::Balance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::AccountDetails => "ACCOUNT_DETAILS",
            Permission::Transactions => "TRANSACTIONS",
            Permission::Balance => "BALANCE",
        }
    }

    /// Human-readable label used on the authorization page.
    pub fn description(&self) -> &'static str {
        match self {
            Permission::AccountDetails => "Read your account details",
            Permission::Transactions => "Read your transaction history",
            Permission::Balance => "Read your account balances",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a permission string is not part of the enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCOUNT_DETAILS" | "account:details:read" => Ok(Permission::AccountDetails),
            "TRANSACTIONS" | "transactions:read" => Ok(Permission::Transactions),
            "BALANCE" | "balances:read" => Ok(Permission::Balance),
            other => Err(UnknownPermission(other.to_string())),
        }
    }
}

/// Lifecycle status of a consent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentStatus {
    /// Created by a TPP, waiting for the customer's decision.
    AwaitingAuthorization,
    /// Approved by the customer.
    Authorized,
    /// Denied by the customer or revoked afterwards.
    Revoked,
}

impl ConsentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentStatus::AwaitingAuthorization => "AWAITING_AUTHORIZATION",
            ConsentStatus::Authorized => "AUTHORIZED",
            ConsentStatus::Revoked => "REVOKED",
        }
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scoped, time-bounded grant of data access from a customer to a TPP.
///
/// Only `permissions` and `status` ever change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Consent {
    pub consent_id: String,
    pub customer_id: String,
    pub bank_id: String,
    pub account_ids: Vec<String>,
    pub permissions: Vec<Permission>,
    pub status: ConsentStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Where the customer approves or denies this consent.
    pub authorization_url: String,
    pub psu_ip_address: String,
    pub psu_user_agent: String,
    pub tpp_id: String,
}

impl Consent {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn covers_account(&self, account_id: &str) -> bool {
        self.account_ids.iter().any(|id| id == account_id)
    }

    /// Required permissions this consent does not grant, in request order.
    pub fn missing_permissions(&self, required: &[Permission]) -> Vec<Permission> {
        required
            .iter()
            .copied()
            .filter(|p| !self.permissions.contains(p))
            .collect()
    }
}

/// Request to create a consent.
///
/// Every field is optional at the JSON level so that missing input is
/// reported by the consent engine with a consistent error envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsentRequest {
    #[serde(default, alias = "customer_id")]
    pub customer_id: Option<String>,
    #[serde(default, alias = "account_ids")]
    pub account_ids: Option<Vec<String>>,
    /// Permission names, e.g. `BALANCE`.
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    #[serde(default, alias = "psu_ip_address")]
    pub psu_ip_address: Option<String>,
    #[serde(default, alias = "psu_user_agent")]
    pub psu_user_agent: Option<String>,
    #[serde(default, alias = "tpp_id")]
    pub tpp_id: Option<String>,
}

/// Partial update of a consent. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConsentRequest {
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<ConsentStatus>,
}

/// Filter for listing consents.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ConsentListQuery {
    /// Only return consents of this customer.
    #[serde(default, alias = "customerId")]
    pub customer_id: Option<String>,
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}
