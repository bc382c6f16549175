// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTML pages of the customer authorization flow.
//!
//! Every interpolated value goes through [`html_escape`].

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::consent::{AuthorizationAction, ConsentError};
use crate::models::Consent;

const STYLE: &str = r#"
        body { font-family: system-ui, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px; }
        h1 { font-size: 24px; margin-bottom: 10px; }
        dl { display: grid; grid-template-columns: max-content auto; gap: 6px 16px; }
        dt { font-weight: 600; color: #444; }
        dd { margin: 0; font-family: ui-monospace, monospace; }
        ul { margin: 0; padding-left: 18px; }
        .actions { display: flex; gap: 12px; margin-top: 30px; }
        button { border: none; padding: 12px 24px; border-radius: 4px; cursor: pointer; font-size: 16px; flex: 1; }
        .approve { background: #28a745; color: white; }
        .deny { background: #dc3545; color: white; }
        .approved { background: #d4edda; border: 1px solid #c3e6cb; color: #155724; padding: 30px; border-radius: 8px; }
        .denied { background: #f8d7da; border: 1px solid #f5c6cb; color: #721c24; padding: 30px; border-radius: 8px; }
        .error { background: #fff3cd; border: 1px solid #ffeeba; color: #856404; padding: 30px; border-radius: 8px; }
"#;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>"#,
        title = html_escape(title),
    )
}

fn list_items<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format!("<li>{}</li>", html_escape(item.as_ref())))
        .collect()
}

/// Approve/deny page for a consent awaiting authorization.
pub fn authorization_page(consent: &Consent) -> Html<String> {
    let permissions = list_items(
        consent
            .permissions
            .iter()
            .map(|p| format!("{} ({})", p.description(), p.as_str())),
    );
    let accounts = list_items(&consent.account_ids);
    let consent_id = html_escape(&consent.consent_id);

    let body = format!(
        r#"    <h1>Authorize data access</h1>
    <p><strong>{tpp_id}</strong> is asking for access to your account data until {expires_at}.</p>
    <dl>
        <dt>Customer</dt><dd>{customer_id}</dd>
        <dt>Bank</dt><dd>{bank_id}</dd>
        <dt>Accounts</dt><dd><ul>{accounts}</ul></dd>
        <dt>Permissions</dt><dd><ul>{permissions}</ul></dd>
    </dl>
    <form method="post" action="/authorize">
        <input type="hidden" name="consent_id" value="{consent_id}">
        <div class="actions">
            <button class="approve" type="submit" name="action" value="approve">Approve</button>
            <button class="deny" type="submit" name="action" value="deny">Deny</button>
        </div>
    </form>"#,
        tpp_id = html_escape(&consent.tpp_id),
        expires_at = html_escape(&consent.expires_at.to_rfc3339()),
        customer_id = html_escape(&consent.customer_id),
        bank_id = html_escape(&consent.bank_id),
    );

    Html(page("Authorize data access", &body))
}

/// Terminal page after the customer's decision.
pub fn result_page(consent: &Consent, action: AuthorizationAction) -> Html<String> {
    let (class, heading, text) = match action {
        AuthorizationAction::Approve => (
            "approved",
            "Consent approved",
            "The provider can now access the data you approved. You can close this window.",
        ),
        AuthorizationAction::Deny => (
            "denied",
            "Consent denied",
            "The provider will not get access to your data. You can close this window.",
        ),
    };

    let body = format!(
        r#"    <div class="{class}">
        <h1>{heading}</h1>
        <p>{text}</p>
        <p>Consent <code>{consent_id}</code> is now <strong>{status}</strong>.</p>
    </div>"#,
        consent_id = html_escape(&consent.consent_id),
        status = consent.status,
    );

    Html(page(heading, &body))
}

/// Error on the authorization pages, rendered as HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageError {
    pub status: StatusCode,
    pub message: String,
}

impl PageError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ConsentError> for PageError {
    fn from(e: ConsentError) -> Self {
        let status = match &e {
            ConsentError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ConsentError::NotFound(_) => StatusCode::NOT_FOUND,
            ConsentError::Forbidden(_) => StatusCode::FORBIDDEN,
            ConsentError::Conflict(_) => StatusCode::CONFLICT,
            ConsentError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let reason = self.status.canonical_reason().unwrap_or("Error");
        let body = format!(
            r#"    <div class="error">
        <h1>{reason}</h1>
        <p>{message}</p>
    </div>"#,
            message = html_escape(&self.message),
        );
        (self.status, Html(page(reason, &body))).into_response()
    }
}
