// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Consent gate for TPP resource routes.
//!
//! Every request to a gated route must carry:
//!
//! - `Authorization: Bearer <token>`
//! - the consent id, as `X-Consent-Id` header or `consent_id` query
//!   parameter
//!
//! The gate re-reads the consent on every request and lets the request
//! through only when [`crate::consent::evaluate`] allows it. It never
//! writes. On success the consent is available to handlers as
//! `Extension<AuthorizedConsent>`.
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/accounts/{account_id}/balance", get(get_balance))
//!     .route_layer(middleware::from_fn_with_state(
//!         ConsentGate::new(state.clone(), &[Permission::Balance]),
//!         consent_gate,
//!     ));
//! ```

use axum::{
    extract::{Query, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use super::extractor::bearer_token;
use crate::consent::{evaluate, CustomerBinding};
use crate::error::ApiError;
use crate::models::{Consent, Permission};
use crate::state::AppState;

/// Header carrying the consent id.
pub const CONSENT_ID_HEADER: &str = "x-consent-id";

/// A consent that passed the gate for the current request.
#[derive(Debug, Clone)]
pub struct AuthorizedConsent(pub Consent);

/// Gate configuration for one group of routes.
#[derive(Clone)]
pub struct ConsentGate {
    state: AppState,
    required: &'static [Permission],
}

impl ConsentGate {
    pub fn new(state: AppState, required: &'static [Permission]) -> Self {
        Self { state, required }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GateQuery {
    #[serde(default, alias = "consentId")]
    consent_id: Option<String>,
    #[serde(default, alias = "customerId")]
    customer_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn consent_id_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONSENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Consent gate middleware.
pub async fn consent_gate(
    State(gate): State<ConsentGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match bearer_token(request.headers()).and_then(|t| gate.state.tokens.verify(t)) {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    let query = match Query::<GateQuery>::try_from_uri(request.uri()) {
        Ok(Query(query)) => query,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };

    let Some(consent_id) =
        non_empty(consent_id_header(request.headers())).or(non_empty(query.consent_id))
    else {
        return ApiError::bad_request(
            "consent id is required (X-Consent-Id header or consent_id query parameter)",
        )
        .into_response();
    };

    let consent = match gate.state.consents.get_consent(&consent_id).await {
        Ok(consent) => consent,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let declared_customer = non_empty(query.customer_id);
    let binding = CustomerBinding::new(user.customer_id.as_deref(), declared_customer.as_deref());

    if let Err(denied) = evaluate(&consent, gate.required, binding, Utc::now()) {
        tracing::info!(
            consent_id = %consent.consent_id,
            caller = %user.user_id,
            reason = %denied,
            "Consent gate denied request"
        );
        return ApiError::forbidden(denied.to_string()).into_response();
    }

    tracing::debug!(
        consent_id = %consent.consent_id,
        caller = %user.user_id,
        "Consent gate allowed request"
    );
    request.extensions_mut().insert(user);
    request.extensions_mut().insert(AuthorizedConsent(consent));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, TokenRequest};
    use crate::consent::engine::tests::{new_consent, seeded_store};
    use crate::consent::AuthorizationAction;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    async fn echo(Extension(AuthorizedConsent(consent)): Extension<AuthorizedConsent>) -> String {
        consent.consent_id
    }

    fn app(state: &AppState, required: &'static [Permission]) -> Router {
        Router::new()
            .route("/resource", get(echo))
            .route_layer(middleware::from_fn_with_state(
                ConsentGate::new(state.clone(), required),
                consent_gate,
            ))
    }

    fn token(state: &AppState, customer_id: Option<&str>) -> String {
        state
            .tokens
            .issue(TokenRequest {
                subject: "tpp-1",
                role: Role::Tpp,
                customer_id,
                ttl: chrono::Duration::hours(1),
            })
            .unwrap()
    }

    async fn authorized_consent(state: &AppState, permissions: &[&str]) -> String {
        let consent = state
            .consents
            .create_consent(new_consent(&["acc-1"], permissions), None)
            .await
            .unwrap();
        state
            .consents
            .authorize(&consent.consent_id, AuthorizationAction::Approve)
            .await
            .unwrap();
        consent.consent_id
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get_request(uri: &str, token: Option<&str>, consent_header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(id) = consent_header {
            builder = builder.header("X-Consent-Id", id);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn allows_authorized_consent_with_scope() {
        let state = AppState::with_store(seeded_store());
        let id = authorized_consent(&state, &["BALANCE"]).await;
        let token = token(&state, None);

        let (status, body) = call(
            app(&state, &[Permission::Balance]),
            get_request("/resource", Some(&token), Some(&id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, id);

        let (status, _) = call(
            app(&state, &[Permission::Balance]),
            get_request(&format!("/resource?consent_id={id}"), Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_missing_or_bad_token() {
        let state = AppState::with_store(seeded_store());
        let id = authorized_consent(&state, &["BALANCE"]).await;

        let (status, _) = call(
            app(&state, &[Permission::Balance]),
            get_request("/resource", None, Some(&id)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            app(&state, &[Permission::Balance]),
            get_request("/resource", Some("garbage"), Some(&id)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_consent_id_is_bad_request() {
        let state = AppState::with_store(seeded_store());
        let token = token(&state, None);
        let (status, _) = call(
            app(&state, &[Permission::Balance]),
            get_request("/resource", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_consent_is_not_found() {
        let state = AppState::with_store(seeded_store());
        let token = token(&state, None);
        let (status, _) = call(
            app(&state, &[Permission::Balance]),
            get_request("/resource", Some(&token), Some("nope")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn pending_consent_is_forbidden() {
        let state = AppState::with_store(seeded_store());
        let consent = state
            .consents
            .create_consent(new_consent(&["acc-1"], &["BALANCE"]), None)
            .await
            .unwrap();
        let token = token(&state, None);

        let (status, body) = call(
            app(&state, &[Permission::Balance]),
            get_request("/resource", Some(&token), Some(&consent.consent_id)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("AWAITING_AUTHORIZATION"));
    }

    #[tokio::test]
    async fn insufficient_scope_is_forbidden() {
        let state = AppState::with_store(seeded_store());
        let id = authorized_consent(&state, &["BALANCE"]).await;
        let token = token(&state, None);

        let (status, _) = call(
            app(&state, &[Permission::Transactions]),
            get_request("/resource", Some(&token), Some(&id)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn customer_binding_is_enforced() {
        let state = AppState::with_store(seeded_store());
        let id = authorized_consent(&state, &["BALANCE"]).await;

        // Declared through the query string.
        let token_without_customer = token(&state, None);
        let (status, _) = call(
            app(&state, &[Permission::Balance]),
            get_request(
                "/resource?customer_id=cust-2",
                Some(&token_without_customer),
                Some(&id),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Declared through the token claim.
        let foreign = token(&state, Some("cust-2"));
        let (status, _) = call(
            app(&state, &[Permission::Balance]),
            get_request("/resource", Some(&foreign), Some(&id)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let own = token(&state, Some("cust-1"));
        let (status, _) = call(
            app(&state, &[Permission::Balance]),
            get_request("/resource", Some(&own), Some(&id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn query_customer_cannot_override_token_customer() {
        let state = AppState::with_store(seeded_store());
        let id = authorized_consent(&state, &["BALANCE"]).await;
        let foreign = token(&state, Some("cust-2"));

        for uri in ["/resource?customer_id=cust-1", "/resource?customerId=cust-1"] {
            let (status, body) = call(
                app(&state, &[Permission::Balance]),
                get_request(uri, Some(&foreign), Some(&id)),
            )
            .await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert!(body.contains("cust-2"), "{body}");
        }

        let own = token(&state, Some("cust-1"));
        let (status, _) = call(
            app(&state, &[Permission::Balance]),
            get_request("/resource?customer_id=cust-1", Some(&own), Some(&id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn revoked_consent_is_forbidden() {
        let state = AppState::with_store(seeded_store());
        let id = authorized_consent(&state, &["BALANCE"]).await;
        state.consents.revoke_consent(&id, None).await.unwrap();
        let token = token(&state, None);

        let (status, _) = call(
            app(&state, &[Permission::Balance]),
            get_request("/resource", Some(&token), Some(&id)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
