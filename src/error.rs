// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::consent::ConsentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// JSON error envelope of the consent and resource APIs.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Status reason phrase, e.g. `Not Found`
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<ConsentError> for ApiError {
    fn from(e: ConsentError) -> Self {
        match e {
            ConsentError::BadRequest(msg) => ApiError::bad_request(msg),
            ConsentError::NotFound(msg) => ApiError::not_found(msg),
            ConsentError::Forbidden(msg) => ApiError::forbidden(msg),
            ConsentError::Conflict(msg) => ApiError::conflict(msg),
            ConsentError::Unavailable(msg) => ApiError::unavailable(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// `Json` request body whose rejections use the [`ApiError`] envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let conflict = ApiError::conflict("elsewhere");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
    }

    #[test]
    fn consent_errors_map_to_statuses() {
        let cases = [
            (ConsentError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ConsentError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ConsentError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ConsentError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ConsentError::Unavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[tokio::test]
    async fn into_response_returns_envelope() {
        let response = ApiError::not_found("Consent c-1 not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "error": "Not Found", "message": "Consent c-1 not found" })
        );
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let err = ApiJson::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
