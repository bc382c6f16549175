// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access decision for TPP resource requests.
//!
//! Access is granted iff the consent is `AUTHORIZED`, not past its
//! expiry, grants every required permission, and belongs to every
//! customer the caller is bound to. Expired consents are treated like
//! revoked ones.

use chrono::{DateTime, Utc};

use crate::models::{Consent, ConsentStatus, Permission};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("consent is {0}, not AUTHORIZED")]
    NotAuthorized(ConsentStatus),

    #[error("consent expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("consent does not grant {}", format_permissions(.0))]
    MissingPermissions(Vec<Permission>),

    #[error("consent does not belong to customer {0}")]
    CustomerMismatch(String),
}

fn format_permissions(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(Permission::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Customers a request is bound to.
///
/// The token's customer always applies. A customer declared on the
/// request narrows further but never replaces the token's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomerBinding<'a> {
    /// `customerId` claim of the verified token.
    pub token: Option<&'a str>,
    /// `customer_id` declared on the request.
    pub declared: Option<&'a str>,
}

impl<'a> CustomerBinding<'a> {
    pub fn new(token: Option<&'a str>, declared: Option<&'a str>) -> Self {
        Self { token, declared }
    }

    fn mismatch(&self, owner: &str) -> Option<&'a str> {
        [self.token, self.declared]
            .into_iter()
            .flatten()
            .find(|customer_id| *customer_id != owner)
    }
}

/// Decide whether `consent` covers a request needing `required`.
pub fn evaluate(
    consent: &Consent,
    required: &[Permission],
    binding: CustomerBinding<'_>,
    now: DateTime<Utc>,
) -> Result<(), AccessDenied> {
    if consent.status != ConsentStatus::Authorized {
        return Err(AccessDenied::NotAuthorized(consent.status));
    }

    if consent.is_expired_at(now) {
        return Err(AccessDenied::Expired(consent.expires_at));
    }

    let missing = consent.missing_permissions(required);
    if !missing.is_empty() {
        return Err(AccessDenied::MissingPermissions(missing));
    }

    if let Some(customer_id) = binding.mismatch(&consent.customer_id) {
        return Err(AccessDenied::CustomerMismatch(customer_id.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn consent(status: ConsentStatus, permissions: Vec<Permission>) -> Consent {
        let created_at = Utc::now();
        Consent {
            consent_id: "c-1".into(),
            customer_id: "cust-1".into(),
            bank_id: "bank-1".into(),
            account_ids: vec!["acc-1".into()],
            permissions,
            status,
            created_at,
            expires_at: created_at + Duration::hours(24),
            authorization_url: "http://localhost/authorize?consent_id=c-1".into(),
            psu_ip_address: "10.0.0.1".into(),
            psu_user_agent: "curl".into(),
            tpp_id: "tpp-1".into(),
        }
    }

    /// Every subset of the permission enumeration.
    fn all_subsets() -> Vec<Vec<Permission>> {
        (0..(1u8 << Permission::ALL.len()))
            .map(|mask| {
                Permission::ALL
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, p)| *p)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn grants_iff_authorized_and_required_is_subset() {
        let now = Utc::now();
        for status in [
            ConsentStatus::AwaitingAuthorization,
            ConsentStatus::Authorized,
            ConsentStatus::Revoked,
        ] {
            for granted in all_subsets() {
                let consent = consent(status, granted.clone());
                for required in all_subsets() {
                    let subset = required.iter().all(|p| granted.contains(p));
                    let expected = subset && status == ConsentStatus::Authorized;
                    let allowed =
                        evaluate(&consent, &required, CustomerBinding::default(), now).is_ok();
                    assert_eq!(
                        allowed, expected,
                        "status={status} granted={granted:?} required={required:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn balance_consent_does_not_cover_transactions() {
        let consent = consent(ConsentStatus::Authorized, vec![Permission::Balance]);
        let result = evaluate(
            &consent,
            &[Permission::Transactions],
            CustomerBinding::default(),
            Utc::now(),
        );
        assert_eq!(
            result,
            Err(AccessDenied::MissingPermissions(vec![Permission::Transactions]))
        );
    }

    #[test]
    fn expired_consent_is_denied() {
        let consent = consent(ConsentStatus::Authorized, vec![Permission::Balance]);
        let later = consent.expires_at + Duration::seconds(1);
        assert!(matches!(
            evaluate(&consent, &[Permission::Balance], CustomerBinding::default(), later),
            Err(AccessDenied::Expired(_))
        ));
        assert!(evaluate(
            &consent,
            &[Permission::Balance],
            CustomerBinding::default(),
            consent.expires_at
        ).is_ok());
    }

    #[test]
    fn bound_customers_must_own_the_consent() {
        let consent = consent(ConsentStatus::Authorized, vec![Permission::Balance]);
        let now = Utc::now();
        let check = |token, declared| {
            evaluate(
                &consent,
                &[Permission::Balance],
                CustomerBinding::new(token, declared),
                now,
            )
        };

        assert!(check(None, None).is_ok());
        assert!(check(Some("cust-1"), None).is_ok());
        assert!(check(None, Some("cust-1")).is_ok());
        assert!(check(Some("cust-1"), Some("cust-1")).is_ok());

        let mismatch = |id: &str| Err(AccessDenied::CustomerMismatch(id.into()));
        assert_eq!(check(Some("cust-2"), None), mismatch("cust-2"));
        assert_eq!(check(None, Some("cust-2")), mismatch("cust-2"));
        assert_eq!(check(Some("cust-1"), Some("cust-2")), mismatch("cust-2"));
        // A declared customer cannot override the token's.
        assert_eq!(check(Some("cust-2"), Some("cust-1")), mismatch("cust-2"));
    }

    #[test]
    fn denial_messages_name_the_reason() {
        let err = AccessDenied::MissingPermissions(vec![
            Permission::Transactions,
            Permission::AccountDetails,
        ]);
        assert_eq!(
            err.to_string(),
            "consent does not grant TRANSACTIONS, ACCOUNT_DETAILS"
        );
        assert_eq!(
            AccessDenied::NotAuthorized(ConsentStatus::Revoked).to_string(),
            "consent is REVOKED, not AUTHORIZED"
        );
    }
}
