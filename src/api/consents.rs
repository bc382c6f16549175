// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Consent API used by TPPs and the bank's own tooling.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{AdminOnly, Auth},
    consent::NewConsent,
    error::{ApiError, ApiJson, ErrorBody},
    models::{Consent, ConsentListQuery, CreateConsentRequest, MessageResponse, UpdateConsentRequest},
    state::AppState,
    storage::AuditEvent,
};

#[utoipa::path(
    post,
    path = "/consent",
    request_body = CreateConsentRequest,
    tag = "Consents",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Consent created, awaiting authorization", body = Consent),
        (status = 400, description = "Missing fields or unknown permission", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Account not owned by the customer", body = ErrorBody),
        (status = 404, description = "Unknown customer, bank or account", body = ErrorBody),
        (status = 409, description = "Account held at another bank", body = ErrorBody)
    )
)]
pub async fn create_consent(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiJson(request): ApiJson<CreateConsentRequest>,
) -> Result<(StatusCode, Json<Consent>), ApiError> {
    let request = NewConsent::try_from(request)?;
    let consent = state
        .consents
        .create_consent(request, Some(&user.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(consent)))
}

#[utoipa::path(
    get,
    path = "/consent",
    params(ConsentListQuery),
    tag = "Consents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = [Consent]),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn list_consents(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Query(query): Query<ConsentListQuery>,
) -> Result<Json<Vec<Consent>>, ApiError> {
    let consents = state
        .consents
        .list_consents(query.customer_id.as_deref())
        .await?;
    Ok(Json(consents))
}

#[utoipa::path(
    get,
    path = "/consent/{consentId}",
    params(("consentId" = String, Path, description = "Consent identifier")),
    tag = "Consents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = Consent),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_consent(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Path(consent_id): Path<String>,
) -> Result<Json<Consent>, ApiError> {
    Ok(Json(state.consents.get_consent(&consent_id).await?))
}

/// Raw update of permissions and/or status.
#[utoipa::path(
    put,
    path = "/consent/{consentId}",
    params(("consentId" = String, Path, description = "Consent identifier")),
    request_body = UpdateConsentRequest,
    tag = "Consents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = Consent),
        (status = 400, description = "Invalid permissions", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn update_consent(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(consent_id): Path<String>,
    ApiJson(update): ApiJson<UpdateConsentRequest>,
) -> Result<Json<Consent>, ApiError> {
    let consent = state
        .consents
        .update_consent(&consent_id, update, Some(&user.user_id))
        .await?;
    Ok(Json(consent))
}

/// Revoke a consent. Repeating the call is harmless.
#[utoipa::path(
    put,
    path = "/consent/{consentId}/revoke",
    params(("consentId" = String, Path, description = "Consent identifier")),
    tag = "Consents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn revoke_consent(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(consent_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state
        .consents
        .revoke_consent(&consent_id, Some(&user.user_id))
        .await?
    {
        return Err(ApiError::not_found("Consent not found"));
    }
    Ok(Json(MessageResponse {
        message: "Consent revoked successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/consent/{consentId}/audit",
    params(("consentId" = String, Path, description = "Consent identifier")),
    tag = "Consents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Audit trail, oldest first", body = [AuditEvent]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Admin role required"),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn consent_audit(
    State(state): State<AppState>,
    AdminOnly(_admin): AdminOnly,
    Path(consent_id): Path<String>,
) -> Result<Json<Vec<AuditEvent>>, ApiError> {
    Ok(Json(state.consents.audit_trail(&consent_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::consent::engine::tests::seeded_store;
    use crate::models::{ConsentStatus, Permission};
    use crate::storage::AuditEventType;

    fn tpp() -> Auth {
        Auth(AuthenticatedUser {
            user_id: "tpp-1".into(),
            role: Role::Tpp,
            customer_id: None,
        })
    }

    fn admin() -> AdminOnly {
        AdminOnly(AuthenticatedUser {
            user_id: "ops".into(),
            role: Role::Admin,
            customer_id: None,
        })
    }

    fn request(account_ids: &[&str], permissions: &[&str]) -> CreateConsentRequest {
        CreateConsentRequest {
            customer_id: Some("cust-1".into()),
            account_ids: Some(account_ids.iter().map(|s| s.to_string()).collect()),
            permissions: Some(permissions.iter().map(|s| s.to_string()).collect()),
            psu_ip_address: Some("10.0.0.1".into()),
            psu_user_agent: Some("Mozilla/5.0".into()),
            tpp_id: Some("tpp-1".into()),
        }
    }

    async fn created(state: &AppState) -> Consent {
        let (_, Json(consent)) = create_consent(
            State(state.clone()),
            tpp(),
            ApiJson(request(&["acc-1"], &["BALANCE"])),
        )
        .await
        .unwrap();
        consent
    }

    #[tokio::test]
    async fn create_returns_pending_consent() {
        let state = AppState::with_store(seeded_store());

        let (status, Json(consent)) = create_consent(
            State(state.clone()),
            tpp(),
            ApiJson(request(&["acc-1", "acc-2"], &["BALANCE", "TRANSACTIONS"])),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(consent.status, ConsentStatus::AwaitingAuthorization);
        assert_eq!(consent.account_ids, vec!["acc-1", "acc-2"]);
        assert_eq!(
            consent.permissions,
            vec![Permission::Balance, Permission::Transactions]
        );
        assert!(consent
            .authorization_url
            .ends_with(&format!("consent_id={}", consent.consent_id)));
    }

    #[tokio::test]
    async fn create_maps_validation_failures() {
        let state = AppState::with_store(seeded_store());

        let mut missing_tpp = request(&["acc-1"], &["BALANCE"]);
        missing_tpp.tpp_id = None;

        let cases = [
            (missing_tpp, StatusCode::BAD_REQUEST),
            (request(&["acc-1"], &["WRITE"]), StatusCode::BAD_REQUEST),
            (request(&["acc-404"], &["BALANCE"]), StatusCode::NOT_FOUND),
            (request(&["acc-3"], &["BALANCE"]), StatusCode::FORBIDDEN),
            (request(&["acc-x"], &["BALANCE"]), StatusCode::CONFLICT),
        ];
        for (body, expected) in cases {
            let err = create_consent(State(state.clone()), tpp(), ApiJson(body))
                .await
                .unwrap_err();
            assert_eq!(err.status, expected, "{}", err.message);
        }

        let Json(all) = list_consents(State(state), tpp(), Query(ConsentListQuery::default()))
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn get_and_list() {
        let state = AppState::with_store(seeded_store());
        let consent = created(&state).await;

        let Json(fetched) = get_consent(State(state.clone()), tpp(), Path(consent.consent_id.clone()))
            .await
            .unwrap();
        assert_eq!(fetched, consent);

        let err = get_consent(State(state.clone()), tpp(), Path("nope".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let Json(mine) = list_consents(
            State(state.clone()),
            tpp(),
            Query(ConsentListQuery {
                customer_id: Some("cust-1".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(mine, vec![consent]);

        let Json(theirs) = list_consents(
            State(state),
            tpp(),
            Query(ConsentListQuery {
                customer_id: Some("cust-2".into()),
            }),
        )
        .await
        .unwrap();
        assert!(theirs.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_permissions() {
        let state = AppState::with_store(seeded_store());
        let consent = created(&state).await;

        let Json(updated) = update_consent(
            State(state.clone()),
            tpp(),
            Path(consent.consent_id.clone()),
            ApiJson(UpdateConsentRequest {
                permissions: Some(vec!["TRANSACTIONS".into()]),
                status: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.permissions, vec![Permission::Transactions]);
        assert_eq!(updated.status, ConsentStatus::AwaitingAuthorization);

        let err = update_consent(
            State(state),
            tpp(),
            Path("nope".into()),
            ApiJson(UpdateConsentRequest::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let state = AppState::with_store(seeded_store());
        let consent = created(&state).await;

        for _ in 0..2 {
            let Json(body) =
                revoke_consent(State(state.clone()), tpp(), Path(consent.consent_id.clone()))
                    .await
                    .unwrap();
            assert_eq!(body.message, "Consent revoked successfully");
        }
        assert_eq!(
            state.consents.get_consent(&consent.consent_id).await.unwrap().status,
            ConsentStatus::Revoked
        );

        let err = revoke_consent(State(state), tpp(), Path("nope".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Consent not found");
    }

    #[tokio::test]
    async fn audit_trail_records_lifecycle() {
        let state = AppState::with_store(seeded_store());
        let consent = created(&state).await;
        revoke_consent(State(state.clone()), tpp(), Path(consent.consent_id.clone()))
            .await
            .unwrap();

        let Json(events) = consent_audit(State(state), admin(), Path(consent.consent_id))
            .await
            .unwrap();
        let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![AuditEventType::ConsentCreated, AuditEventType::ConsentRevoked]
        );
        assert_eq!(events[0].actor.as_deref(), Some("tpp-1"));
    }
}
