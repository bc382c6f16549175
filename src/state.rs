// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Settings;
use crate::consent::ConsentService;
use crate::storage::Storage;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub consents: ConsentService,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(consents: ConsentService, tokens: TokenService) -> Self {
        Self {
            consents,
            tokens: Arc::new(tokens),
        }
    }

    /// Wire the engine and token verifier from settings around `storage`.
    pub fn from_settings(settings: &Settings, storage: Arc<dyn Storage>) -> Self {
        let consents = ConsentService::new(
            settings.bank_id.clone(),
            storage,
            settings.authorization_base_url.clone(),
            settings.storage_timeout,
        );
        let tokens = TokenService::new(
            settings.jwt_secret.as_bytes(),
            settings.jwt_issuer.clone(),
            settings.jwt_audience.clone(),
        );
        Self::new(consents, tokens)
    }
}

#[cfg(test)]
impl AppState {
    pub const TEST_SECRET: &'static [u8] = b"test-secret";

    /// State over `storage` for bank `bank-1`.
    pub fn with_store(storage: Arc<dyn Storage>) -> Self {
        let consents = ConsentService::new(
            crate::consent::engine::tests::BANK,
            storage,
            url::Url::parse("http://localhost:8080/authorize").expect("static url"),
            std::time::Duration::from_secs(5),
        );
        let tokens = TokenService::new(
            Self::TEST_SECRET,
            "banking-simulation",
            "api.banking-simulation.com",
        );
        Self::new(consents, tokens)
    }

    /// State over an empty in-memory store.
    pub fn for_tests() -> Self {
        Self::with_store(Arc::new(crate::storage::InMemoryStore::new()))
    }
}
