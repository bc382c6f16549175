// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{HeaderName, Request},
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{consent_gate, ConsentGate},
    error::ErrorBody,
    models::{
        Account, AccountStatus, AccountType, Balance, Consent, ConsentStatus,
        CreateConsentRequest, MessageResponse, Permission, Transaction, TransactionStatus,
        TransactionType, UpdateConsentRequest,
    },
    state::AppState,
    storage::{AuditEvent, AuditEventType},
};

pub mod accounts;
pub mod authorize;
pub mod consents;
pub mod health;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Routes behind the consent gate requiring `permissions`.
fn gated(
    state: &AppState,
    permissions: &'static [Permission],
    routes: Router<AppState>,
) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(
        ConsentGate::new(state.clone(), permissions),
        consent_gate,
    ))
}

pub fn router(state: AppState) -> Router {
    let consent_routes = Router::new()
        .route(
            "/consent",
            get(consents::list_consents).post(consents::create_consent),
        )
        .route(
            "/consent/{consentId}",
            get(consents::get_consent).put(consents::update_consent),
        )
        .route("/consent/{consentId}/revoke", put(consents::revoke_consent))
        .route("/consent/{consentId}/audit", get(consents::consent_audit));

    let authorize_routes = Router::new().route(
        "/authorize",
        get(authorize::authorization_page).post(authorize::submit_decision),
    );

    let account_routes = gated(
        &state,
        &[Permission::AccountDetails],
        Router::new()
            .route("/accounts", get(accounts::list_accounts))
            .route("/accounts/{account_id}", get(accounts::get_account)),
    )
    .merge(gated(
        &state,
        &[Permission::Balance],
        Router::new().route("/accounts/{account_id}/balance", get(accounts::get_balance)),
    ))
    .merge(gated(
        &state,
        &[Permission::Transactions],
        Router::new().route(
            "/accounts/{account_id}/transactions",
            get(accounts::list_transactions),
        ),
    ));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(consent_routes)
        .merge(authorize_routes)
        .merge(account_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        consents::create_consent,
        consents::list_consents,
        consents::get_consent,
        consents::update_consent,
        consents::revoke_consent,
        consents::consent_audit,
        authorize::authorization_page,
        authorize::submit_decision,
        accounts::list_accounts,
        accounts::get_account,
        accounts::get_balance,
        accounts::list_transactions,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Consent,
            ConsentStatus,
            Permission,
            CreateConsentRequest,
            UpdateConsentRequest,
            MessageResponse,
            AuditEvent,
            AuditEventType,
            Account,
            AccountType,
            AccountStatus,
            Balance,
            Transaction,
            TransactionType,
            TransactionStatus,
            ErrorBody,
            authorize::AuthorizeForm,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Consents", description = "Consent lifecycle for third-party providers"),
        (name = "Authorization", description = "Customer approve/deny pages"),
        (name = "Accounts", description = "Consent-gated account data"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the handlers.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
