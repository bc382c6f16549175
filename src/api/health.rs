// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Consent storage reachability ("ok" or "unavailable").
    pub storage: String,
    /// Bank this instance serves.
    pub bank_id: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

async fn check_storage(state: &AppState) -> bool {
    match state.consents.storage_health().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            false
        }
    }
}

/// Returns 200 if storage answers, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let storage_ok = check_storage(&state).await;

    let response = ReadyResponse {
        status: if storage_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            storage: if storage_ok { "ok" } else { "unavailable" }.to_string(),
            bank_id: state.consents.bank_id().to_string(),
        },
    };

    let status = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe. Does not touch storage.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthy_with_in_memory_storage() {
        let (status, Json(body)) = health(State(AppState::for_tests())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.checks.storage, "ok");
        assert_eq!(body.checks.bank_id, "bank-1");
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, "ok");
    }
}
