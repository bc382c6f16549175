// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Pull the bearer token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Extractor for authenticated callers.
///
/// Reuses the caller resolved by the consent gate when present, otherwise
/// verifies the bearer token itself.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let token = bearer_token(&parts.headers)?;
        let user = state.tokens.verify(token)?;
        parts.extensions.insert(user.clone());

        Ok(Auth(user))
    }
}

/// Extractor that requires the admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, TokenRequest};
    use crate::state::AppState;
    use axum::http::Request;

    fn parts(auth: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn token(state: &AppState, role: Role) -> String {
        state
            .tokens
            .issue(TokenRequest {
                subject: "user_123",
                role,
                customer_id: None,
                ttl: chrono::Duration::hours(1),
            })
            .unwrap()
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(AuthError::MissingAuthHeader));

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Err(AuthError::InvalidAuthHeader));

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), Err(AuthError::InvalidAuthHeader));

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Ok("abc.def.ghi"));
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let state = AppState::for_tests();
        let mut parts = parts(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_jwt() {
        let state = AppState::for_tests();
        let token = token(&state, Role::Tpp);
        let mut parts = parts(Some(format!("Bearer {token}")));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.role, Role::Tpp);
    }

    #[tokio::test]
    async fn auth_extractor_rejects_tampered_token() {
        let state = AppState::for_tests();
        let token = format!("{}x", token(&state, Role::Tpp));
        let mut parts = parts(Some(format!("Bearer {token}")));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(
            result,
            Err(AuthError::InvalidSignature | AuthError::MalformedToken)
        ));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let state = AppState::for_tests();
        let mut parts = parts(None);
        parts.extensions.insert(AuthenticatedUser {
            user_id: "user_from_gate".to_string(),
            role: Role::Tpp,
            customer_id: None,
        });

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, "user_from_gate");
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let state = AppState::for_tests();
        let token = token(&state, Role::Tpp);
        let mut parts = parts(Some(format!("Bearer {token}")));

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let state = AppState::for_tests();
        let token = token(&state, Role::Admin);
        let mut parts = parts(Some(format!("Bearer {token}")));

        assert!(AdminOnly::from_request_parts(&mut parts, &state).await.is_ok());
    }
}
