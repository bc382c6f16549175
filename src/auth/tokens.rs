// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 bearer tokens.
//!
//! Verification is what the API needs; issuing exists for the demo seed
//! and for tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{AuthError, AuthenticatedUser, Role, TokenClaims};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Shared-secret token issuer and verifier.
#[derive(Clone)]
pub struct TokenService {
    issuer: String,
    audience: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// What to put into an issued token.
#[derive(Debug, Clone)]
pub struct TokenRequest<'a> {
    pub subject: &'a str,
    pub role: Role,
    pub customer_id: Option<&'a str>,
    pub ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a token for `request`.
    pub fn issue(&self, request: TokenRequest<'_>) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: request.subject.to_string(),
            iat: now.timestamp(),
            exp: (now + request.ttl).timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            role: request.role.to_string(),
            customer_id: request.customer_id.map(str::to_string),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("failed to encode token: {e}")))
    }

    /// Verify signature, expiry, issuer and audience.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(AuthenticatedUser::from_claims(token_data.claims))
    }
}
