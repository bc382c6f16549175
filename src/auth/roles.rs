// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller roles carried in bearer tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Caller roles.
///
/// Roles are flat: only `Admin` unlocks anything (the audit trail).
///
/// - `Admin` - bank staff; may read consent audit trails
/// - `Customer` - a bank customer (PSU); tokens carry their customer id
/// - `Tpp` - a third-party provider reading data under a consent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
    Tpp,
}

impl Role {
    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "customer" => Some(Role::Customer),
            "tpp" => Some(Role::Tpp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
            Role::Tpp => "tpp",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("TPP"), Some(Role::Tpp));
        assert_eq!(Role::parse("Customer"), Some(Role::Customer));
        assert_eq!(Role::parse("auditor"), None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for role in [Role::Admin, Role::Customer, Role::Tpp] {
            assert_eq!(Role::parse(&role.to_string()), Some(role));
        }
    }
}
