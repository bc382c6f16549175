// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Customer authorization pages.
//!
//! Not behind bearer auth: the consent id in the link handed out at
//! creation is what lets the customer reach the page.

use axum::{
    extract::{rejection::FormRejection, Query, State},
    response::Html,
    Form,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::consent::{lifecycle, AuthorizationAction, ConsentError};
use crate::models::Consent;
use crate::state::AppState;
use crate::views::{self, PageError};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AuthorizeQuery {
    /// Consent to decide on.
    #[serde(default, alias = "consentId")]
    pub consent_id: Option<String>,
}

/// Body posted by the approve/deny buttons.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AuthorizeForm {
    #[serde(default, alias = "consentId")]
    pub consent_id: Option<String>,
    /// `approve` or `deny`
    #[serde(default)]
    pub action: Option<String>,
}

fn require_consent_id(consent_id: Option<String>) -> Result<String, PageError> {
    consent_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PageError::bad_request("consent_id is required"))
}

/// Load a consent that is still waiting for the customer's decision.
async fn pending_consent(state: &AppState, consent_id: &str) -> Result<Consent, PageError> {
    let consent = state.consents.get_consent(consent_id).await?;
    if lifecycle::is_terminal(consent.status) {
        return Err(ConsentError::not_awaiting_authorization().into());
    }
    Ok(consent)
}

#[utoipa::path(
    get,
    path = "/authorize",
    params(AuthorizeQuery),
    tag = "Authorization",
    responses(
        (status = 200, description = "Approve/deny page", content_type = "text/html", body = String),
        (status = 400, description = "Missing id or consent already decided", content_type = "text/html", body = String),
        (status = 404, description = "Unknown consent", content_type = "text/html", body = String)
    )
)]
pub async fn authorization_page(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Html<String>, PageError> {
    let consent_id = require_consent_id(query.consent_id)?;
    let consent = pending_consent(&state, &consent_id).await?;
    Ok(views::authorization_page(&consent))
}

#[utoipa::path(
    post,
    path = "/authorize",
    request_body(content = AuthorizeForm, content_type = "application/x-www-form-urlencoded"),
    tag = "Authorization",
    responses(
        (status = 200, description = "Decision recorded", content_type = "text/html", body = String),
        (status = 400, description = "Invalid action or consent already decided", content_type = "text/html", body = String),
        (status = 404, description = "Unknown consent", content_type = "text/html", body = String)
    )
)]
pub async fn submit_decision(
    State(state): State<AppState>,
    form: Result<Form<AuthorizeForm>, FormRejection>,
) -> Result<Html<String>, PageError> {
    let Form(form) = form.map_err(|rejection| PageError::bad_request(rejection.body_text()))?;
    let consent_id = require_consent_id(form.consent_id)?;

    pending_consent(&state, &consent_id).await?;

    let action = form
        .action
        .as_deref()
        .unwrap_or_default()
        .parse::<AuthorizationAction>()?;

    let consent = state.consents.authorize(&consent_id, action).await?;
    Ok(views::result_page(&consent, action))
}
