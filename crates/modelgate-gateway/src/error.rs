// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`ModelgateError`] to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use modelgate_core::ModelgateError;
use serde::Serialize;
use tracing::warn;

/// Error response body, in the OpenAI `{"error": {...}}` envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Vendor status, for upstream errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

/// Handler error.
#[derive(Debug)]
pub enum ApiError {
    /// The request itself was unusable.
    BadRequest(String),
    /// Raised by the pipeline.
    Pipeline(ModelgateError),
}

impl From<ModelgateError> for ApiError {
    fn from(err: ModelgateError) -> Self {
        ApiError::Pipeline(err)
    }
}

/// Status code and error type for a pipeline error.
///
/// Configuration errors are 400, availability errors 503, upstream errors
/// keep the vendor's status, and anything else is 500.
pub fn status_for(err: &ModelgateError) -> (StatusCode, &'static str) {
    match err {
        ModelgateError::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
        ModelgateError::UnknownModel { .. } | ModelgateError::NoProvidersConfigured => {
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
        ModelgateError::Upstream { status, .. } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            "upstream_error",
        ),
        ModelgateError::Transport { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "transport_error"),
        ModelgateError::Timeout { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "timeout"),
        ModelgateError::Storage { .. } | ModelgateError::Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message,
                    kind: "invalid_request",
                    upstream_status: None,
                },
            ),
            ApiError::Pipeline(err) => {
                let (status, kind) = status_for(&err);
                if status.is_server_error() {
                    warn!(error = %err, status = status.as_u16(), "request failed");
                }
                (
                    status,
                    ErrorBody {
                        message: err.to_string(),
                        kind,
                        upstream_status: err.status(),
                    },
                )
            }
        };
        (status, Json(ErrorResponse { error: body })).into_response()
    }
}
