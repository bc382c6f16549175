// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Consent engine.
//!
//! Owns every consent write. Handlers translate transport input into calls
//! on [`ConsentService`] and map [`ConsentError`] onto their surface.
//!
//! Storage adapters are synchronous, so each engine operation runs its
//! storage work as one closure on the blocking pool, bounded by the
//! configured storage timeout.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use url::Url;
use uuid::Uuid;

use super::lifecycle::{self, AuthorizationAction, AWAITING};
use super::ConsentError;
use crate::models::{
    Account, Consent, ConsentStatus, CreateConsentRequest, Permission, UpdateConsentRequest,
};
use crate::storage::{AuditEvent, AuditEventType, ConsentPatch, Storage};

/// How long a consent stays usable after creation.
pub const CONSENT_VALIDITY_HOURS: i64 = 24;

/// Validated input for [`ConsentService::create_consent`].
///
/// Presence checks happen when converting from the request body; the
/// referential checks need storage and happen in the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConsent {
    pub customer_id: String,
    pub account_ids: Vec<String>,
    /// Raw permission names, validated after the referential checks.
    pub permissions: Vec<String>,
    pub psu_ip_address: String,
    pub psu_user_agent: String,
    pub tpp_id: String,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<CreateConsentRequest> for NewConsent {
    type Error = ConsentError;

    fn try_from(request: CreateConsentRequest) -> Result<Self, Self::Error> {
        let missing = || {
            ConsentError::BadRequest(
                "customerId, at least one permission, psuIpAddress, psuUserAgent and tppId are required"
                    .to_string(),
            )
        };

        let customer_id = required(request.customer_id).ok_or_else(missing)?;
        let permissions = request
            .permissions
            .filter(|p| !p.is_empty())
            .ok_or_else(missing)?;
        let psu_ip_address = required(request.psu_ip_address).ok_or_else(missing)?;
        let psu_user_agent = required(request.psu_user_agent).ok_or_else(missing)?;
        let tpp_id = required(request.tpp_id).ok_or_else(missing)?;

        let account_ids = request
            .account_ids
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| {
                ConsentError::BadRequest("at least one account id must be provided".to_string())
            })?;

        Ok(Self {
            customer_id,
            account_ids: dedupe(account_ids),
            permissions,
            psu_ip_address,
            psu_user_agent,
            tpp_id,
        })
    }
}

/// Drop repeated entries, keeping first-seen order.
fn dedupe<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

/// Parse permission names, rejecting the first unknown one.
pub fn parse_permissions(names: &[String]) -> Result<Vec<Permission>, ConsentError> {
    let permissions = names
        .iter()
        .map(|name| {
            name.parse::<Permission>()
                .map_err(|e| ConsentError::BadRequest(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(dedupe(permissions))
}

/// Record an audit event; failures are logged and never fail the caller.
fn record(storage: &dyn Storage, event: AuditEvent) {
    if let Err(e) = storage.append_audit(&event) {
        tracing::warn!(
            consent_id = %event.consent_id,
            event_type = ?event.event_type,
            error = %e,
            "Failed to append consent audit event"
        );
    }
}

/// Consent lifecycle operations for one bank.
#[derive(Clone)]
pub struct ConsentService {
    bank_id: String,
    storage: Arc<dyn Storage>,
    authorization_base_url: Url,
    storage_timeout: StdDuration,
}

impl ConsentService {
    pub fn new(
        bank_id: impl Into<String>,
        storage: Arc<dyn Storage>,
        authorization_base_url: Url,
        storage_timeout: StdDuration,
    ) -> Self {
        Self {
            bank_id: bank_id.into(),
            storage,
            authorization_base_url,
            storage_timeout,
        }
    }

    /// The bank context every lookup is scoped to.
    pub fn bank_id(&self) -> &str {
        &self.bank_id
    }

    /// Run storage work on the blocking pool under the storage timeout.
    ///
    /// The closure sees the raw adapter; storage errors convert into
    /// [`ConsentError`] through `?`. Kept inside this module so consent
    /// records are only written by the operations below.
    pub(super) async fn with_storage<T, F>(
        &self,
        operation: &'static str,
        work: F,
    ) -> Result<T, ConsentError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Storage) -> Result<T, ConsentError> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        let task = tokio::task::spawn_blocking(move || work(storage.as_ref()));

        match tokio::time::timeout(self.storage_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                tracing::error!(operation, error = %join_error, "Storage task failed");
                Err(ConsentError::Unavailable("storage is unavailable".to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.storage_timeout.as_millis() as u64,
                    "Storage call timed out"
                );
                Err(ConsentError::Unavailable(
                    "storage did not respond in time".to_string(),
                ))
            }
        }
    }

    fn authorization_url(&self, consent_id: &str) -> String {
        let mut url = self.authorization_base_url.clone();
        url.query_pairs_mut().append_pair("consent_id", consent_id);
        url.to_string()
    }

    /// Validate and persist a new consent in `AWAITING_AUTHORIZATION`.
    ///
    /// Checks run in a fixed order and stop at the first failure; nothing
    /// is written unless all of them pass.
    pub async fn create_consent(
        &self,
        request: NewConsent,
        actor: Option<&str>,
    ) -> Result<Consent, ConsentError> {
        let bank_id = self.bank_id.clone();
        let consent_id = Uuid::new_v4().to_string();
        let authorization_url = self.authorization_url(&consent_id);
        let actor = actor.map(str::to_string);

        let consent = self
            .with_storage("create_consent", move |storage| {
                let customer = storage
                    .get_customer(&request.customer_id)?
                    .filter(|c| c.bank_id == bank_id)
                    .ok_or_else(|| {
                        ConsentError::NotFound(format!(
                            "Customer with ID {} does not exist",
                            request.customer_id
                        ))
                    })?;

                if storage.get_bank(&customer.bank_id)?.is_none() {
                    return Err(ConsentError::NotFound(format!(
                        "Bank with ID {} does not exist",
                        customer.bank_id
                    )));
                }

                let mut accounts: Vec<Account> = Vec::with_capacity(request.account_ids.len());
                for account_id in &request.account_ids {
                    let account = storage.get_account(account_id)?.ok_or_else(|| {
                        ConsentError::NotFound(format!(
                            "Account with ID {account_id} does not exist"
                        ))
                    })?;
                    accounts.push(account);
                }

                if let Some(account) = accounts.iter().find(|a| a.bank_id != customer.bank_id) {
                    return Err(ConsentError::Conflict(format!(
                        "Account with ID {} does not belong to bank with ID {}",
                        account.id, customer.bank_id
                    )));
                }

                if let Some(account) = accounts.iter().find(|a| a.customer_id != customer.id) {
                    return Err(ConsentError::Forbidden(format!(
                        "Account with ID {} does not belong to customer with ID {}",
                        account.id, customer.id
                    )));
                }

                let permissions = parse_permissions(&request.permissions)?;

                let created_at = Utc::now();
                let consent = Consent {
                    consent_id,
                    customer_id: customer.id,
                    bank_id: customer.bank_id,
                    account_ids: request.account_ids,
                    permissions,
                    status: AWAITING,
                    created_at,
                    expires_at: created_at + Duration::hours(CONSENT_VALIDITY_HOURS),
                    authorization_url,
                    psu_ip_address: request.psu_ip_address,
                    psu_user_agent: request.psu_user_agent,
                    tpp_id: request.tpp_id,
                };
                storage.insert_consent(&consent)?;

                record(
                    storage,
                    AuditEvent::new(AuditEventType::ConsentCreated, &consent.consent_id)
                        .with_tpp(&consent.tpp_id)
                        .with_actor(actor.as_deref())
                        .with_details(serde_json::json!({
                            "psuIpAddress": consent.psu_ip_address,
                            "psuUserAgent": consent.psu_user_agent,
                            "accountIds": consent.account_ids,
                            "permissions": consent.permissions,
                        })),
                );
                Ok(consent)
            })
            .await?;

        tracing::info!(
            consent_id = %consent.consent_id,
            customer_id = %consent.customer_id,
            tpp_id = %consent.tpp_id,
            "Consent created"
        );
        Ok(consent)
    }

    /// Load a consent of this bank. Consents of other banks are reported
    /// as not found.
    pub async fn get_consent(&self, consent_id: &str) -> Result<Consent, ConsentError> {
        let bank_id = self.bank_id.clone();
        let id = consent_id.to_string();
        self.with_storage("get_consent", move |storage| {
            storage
                .get_consent(&id)?
                .filter(|c| c.bank_id == bank_id)
                .ok_or_else(|| ConsentError::consent_not_found(&id))
        })
        .await
    }

    /// Consents of this bank, oldest first, optionally for one customer.
    pub async fn list_consents(
        &self,
        customer_id: Option<&str>,
    ) -> Result<Vec<Consent>, ConsentError> {
        let bank_id = self.bank_id.clone();
        let customer_id = customer_id.map(str::to_string);
        self.with_storage("list_consents", move |storage| {
            let consents = storage.list_consents(&bank_id)?;
            Ok(match customer_id {
                Some(customer_id) => consents
                    .into_iter()
                    .filter(|c| c.customer_id == customer_id)
                    .collect(),
                None => consents,
            })
        })
        .await
    }

    /// Raw partial update of `permissions` and/or `status`.
    ///
    /// Does not check transition legality; the authorization flow is the
    /// only path that does.
    pub async fn update_consent(
        &self,
        consent_id: &str,
        update: UpdateConsentRequest,
        actor: Option<&str>,
    ) -> Result<Consent, ConsentError> {
        let permissions = match update.permissions {
            Some(names) if names.is_empty() => {
                return Err(ConsentError::BadRequest(
                    "permissions must not be empty".to_string(),
                ))
            }
            Some(names) => Some(parse_permissions(&names)?),
            None => None,
        };
        let patch = ConsentPatch {
            permissions,
            status: update.status,
        };

        let bank_id = self.bank_id.clone();
        let id = consent_id.to_string();
        let actor = actor.map(str::to_string);

        let consent = self
            .with_storage("update_consent", move |storage| {
                let current = storage
                    .get_consent(&id)?
                    .filter(|c| c.bank_id == bank_id)
                    .ok_or_else(|| ConsentError::consent_not_found(&id))?;

                if patch == ConsentPatch::default() {
                    return Ok(current);
                }

                let updated = storage.patch_consent(&id, &patch)?;
                record(
                    storage,
                    AuditEvent::new(AuditEventType::ConsentUpdated, &id)
                        .with_tpp(&updated.tpp_id)
                        .with_actor(actor.as_deref())
                        .with_details(serde_json::json!({
                            "previousStatus": current.status,
                            "status": updated.status,
                            "permissions": updated.permissions,
                        })),
                );
                Ok(updated)
            })
            .await?;

        tracing::info!(
            consent_id = %consent.consent_id,
            status = %consent.status,
            "Consent updated"
        );
        Ok(consent)
    }

    /// Set `REVOKED` unconditionally. Returns `false` for unknown ids.
    pub async fn revoke_consent(
        &self,
        consent_id: &str,
        actor: Option<&str>,
    ) -> Result<bool, ConsentError> {
        let bank_id = self.bank_id.clone();
        let id = consent_id.to_string();
        let actor = actor.map(str::to_string);

        let revoked = self
            .with_storage("revoke_consent", move |storage| {
                let Some(current) = storage.get_consent(&id)?.filter(|c| c.bank_id == bank_id)
                else {
                    return Ok(false);
                };

                storage.patch_consent(&id, &ConsentPatch::status(ConsentStatus::Revoked))?;
                record(
                    storage,
                    AuditEvent::new(AuditEventType::ConsentRevoked, &id)
                        .with_tpp(&current.tpp_id)
                        .with_actor(actor.as_deref())
                        .with_details(serde_json::json!({ "previousStatus": current.status })),
                );
                Ok(true)
            })
            .await?;

        if revoked {
            tracing::info!(consent_id, "Consent revoked");
        } else {
            tracing::debug!(consent_id, "Revoke requested for unknown consent");
        }
        Ok(revoked)
    }

    /// Apply the customer's decision.
    ///
    /// The new status is written with a conditional update keyed on
    /// `AWAITING_AUTHORIZATION`; a consent that is already terminal, or
    /// that another request finalized first, is rejected unchanged.
    pub async fn authorize(
        &self,
        consent_id: &str,
        action: AuthorizationAction,
    ) -> Result<Consent, ConsentError> {
        let bank_id = self.bank_id.clone();
        let id = consent_id.to_string();

        let consent = self
            .with_storage("authorize_consent", move |storage| {
                let current = storage
                    .get_consent(&id)?
                    .filter(|c| c.bank_id == bank_id)
                    .ok_or_else(|| ConsentError::consent_not_found(&id))?;

                let next = lifecycle::transition(current.status, action)?;
                let updated = storage.compare_and_set_status(&id, AWAITING, next)?;

                let event_type = match action {
                    AuthorizationAction::Approve => AuditEventType::ConsentAuthorized,
                    AuthorizationAction::Deny => AuditEventType::ConsentDenied,
                };
                record(
                    storage,
                    AuditEvent::new(event_type, &id)
                        .with_tpp(&updated.tpp_id)
                        .with_actor(Some(updated.customer_id.as_str())),
                );
                Ok(updated)
            })
            .await;

        match &consent {
            Ok(consent) => tracing::info!(
                consent_id,
                action = %action,
                status = %consent.status,
                "Consent decision applied"
            ),
            Err(e) => tracing::warn!(consent_id, action = %action, error = %e, "Consent decision rejected"),
        }
        consent
    }

    /// Audit trail of a consent of this bank, oldest first.
    pub async fn audit_trail(&self, consent_id: &str) -> Result<Vec<AuditEvent>, ConsentError> {
        let bank_id = self.bank_id.clone();
        let id = consent_id.to_string();
        self.with_storage("consent_audit_trail", move |storage| {
            if storage
                .get_consent(&id)?
                .filter(|c| c.bank_id == bank_id)
                .is_none()
            {
                return Err(ConsentError::consent_not_found(&id));
            }
            let mut events = storage.list_audit(&id)?;
            events.sort_by_key(|e| e.timestamp);
            Ok(events)
        })
        .await
    }
}
