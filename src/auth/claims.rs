// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated caller representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims of a bearer token issued by the banking simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (user or TPP id)
    pub sub: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Role name; unknown values fall back to `tpp`
    pub role: String,
    /// Customer the token acts for (customer tokens only)
    #[serde(
        default,
        rename = "customerId",
        alias = "customer_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_id: Option<String>,
}

/// Authenticated caller extracted from a verified token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Token subject
    pub user_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Self {
        let role = Role::parse(&claims.role).unwrap_or(Role::Tpp);
        Self {
            user_id: claims.sub,
            role,
            customer_id: claims.customer_id.filter(|id| !id.is_empty()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            sub: "user_123".to_string(),
            iat: 1700000000,
            exp: 1700003600,
            iss: "banking-simulation".to_string(),
            aud: "api.banking-simulation.com".to_string(),
            role: "customer".to_string(),
            customer_id: Some("cust-1".to_string()),
        }
    }

    #[test]
    fn from_claims_extracts_identity() {
        let user = AuthenticatedUser::from_claims(sample_claims());
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.customer_id.as_deref(), Some("cust-1"));
    }

    #[test]
    fn empty_customer_id_means_unbound() {
        let mut claims = sample_claims();
        claims.customer_id = Some(String::new());
        assert_eq!(AuthenticatedUser::from_claims(claims).customer_id, None);
    }

    #[test]
    fn unknown_role_defaults_to_tpp() {
        let mut claims = sample_claims();
        claims.role = "robot".to_string();
        let user = AuthenticatedUser::from_claims(claims);
        assert_eq!(user.role, Role::Tpp);
        assert!(!user.is_admin());
    }

    #[test]
    fn customer_id_claim_is_camel_case_on_the_wire() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json["customerId"], "cust-1");

        let claims: TokenClaims = serde_json::from_value(serde_json::json!({
            "sub": "u", "iat": 0, "exp": 0, "iss": "i", "aud": "a",
            "role": "customer", "customer_id": "cust-2"
        }))
        .unwrap();
        assert_eq!(claims.customer_id.as_deref(), Some("cust-2"));
    }
}
