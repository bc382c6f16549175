// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token authentication for the consent API and the consent gate
//! in front of TPP resource routes.
//!
//! ## Auth Flow
//!
//! 1. The auth service of the banking simulation issues HS256 JWTs
//! 2. Callers send `Authorization: Bearer <JWT>`
//! 3. This server:
//!    - Verifies signature, expiry, issuer and audience with the shared
//!      secret
//!    - Extracts:
//!      - `sub` → `user_id`
//!      - `role`, `customerId`
//!
//! ## Security
//!
//! - Consent API and resource routes require authentication
//! - Resource routes additionally require an authorized consent
//!   (see [`middleware`])
//! - The authorization pages are unauthenticated; the consent id acts as
//!   the capability
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod roles;
pub mod tokens;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use middleware::{consent_gate, AuthorizedConsent, ConsentGate};
pub use roles::Role;
pub use tokens::{TokenRequest, TokenService};
