// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account data served to TPPs behind the consent gate.
//!
//! The gate has already checked status, expiry, scope and customer; these
//! handlers only narrow access to the accounts listed on the consent.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::{
    auth::AuthorizedConsent,
    error::{ApiError, ErrorBody},
    models::{Account, Balance, Consent, Transaction},
    state::AppState,
};

fn ensure_covered(consent: &Consent, account_id: &str) -> Result<(), ApiError> {
    if consent.covers_account(account_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "consent does not cover account {account_id}"
        )))
    }
}

#[utoipa::path(
    get,
    path = "/accounts",
    tag = "Accounts",
    params(("X-Consent-Id" = String, Header, description = "Authorized consent with ACCOUNT_DETAILS")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Accounts covered by the consent", body = [Account]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Consent does not allow access", body = ErrorBody),
        (status = 404, description = "Unknown consent", body = ErrorBody)
    )
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(AuthorizedConsent(consent)): Extension<AuthorizedConsent>,
) -> Result<Json<Vec<Account>>, ApiError> {
    let accounts = state.consents.consented_accounts(&consent).await?;
    Ok(Json(accounts))
}

#[utoipa::path(
    get,
    path = "/accounts/{account_id}",
    tag = "Accounts",
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("X-Consent-Id" = String, Header, description = "Authorized consent with ACCOUNT_DETAILS")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = Account),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Consent does not allow access", body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_account(
    State(state): State<AppState>,
    Extension(AuthorizedConsent(consent)): Extension<AuthorizedConsent>,
    Path(account_id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    ensure_covered(&consent, &account_id)?;
    let account = state.consents.account(&account_id).await?;
    Ok(Json(account))
}

#[utoipa::path(
    get,
    path = "/accounts/{account_id}/balance",
    tag = "Accounts",
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("X-Consent-Id" = String, Header, description = "Authorized consent with BALANCE")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = Balance),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Consent does not allow access", body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Extension(AuthorizedConsent(consent)): Extension<AuthorizedConsent>,
    Path(account_id): Path<String>,
) -> Result<Json<Balance>, ApiError> {
    ensure_covered(&consent, &account_id)?;
    let balance = state.consents.balance(&account_id).await?;
    Ok(Json(balance))
}

#[utoipa::path(
    get,
    path = "/accounts/{account_id}/transactions",
    tag = "Accounts",
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("X-Consent-Id" = String, Header, description = "Authorized consent with TRANSACTIONS")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Transactions, oldest first", body = [Transaction]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Consent does not allow access", body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(AuthorizedConsent(consent)): Extension<AuthorizedConsent>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    ensure_covered(&consent, &account_id)?;
    let transactions = state.consents.transactions(&account_id).await?;
    Ok(Json(transactions))
}
