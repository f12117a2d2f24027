// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of [`SwitchboardError`] onto application API responses.
//!
//! Body shape: `{"error": {"code": "...", "message": "...", "suggestion": "..."}}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use switchboard_core::SwitchboardError;

/// Error returned by application API handlers.
#[derive(Debug)]
pub struct ApiError(pub SwitchboardError);

impl From<SwitchboardError> for ApiError {
    fn from(err: SwitchboardError) -> Self {
        ApiError(err)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SwitchboardError::NotFound { .. } => StatusCode::NOT_FOUND,
            SwitchboardError::CapabilityDenied { .. } => StatusCode::FORBIDDEN,
            SwitchboardError::NoCapableNumber { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SwitchboardError::InvalidInput(_) | SwitchboardError::Markup(_) => {
                StatusCode::BAD_REQUEST
            }
            SwitchboardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SwitchboardError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            SwitchboardError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            SwitchboardError::Config(_)
            | SwitchboardError::Storage { .. }
            | SwitchboardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match &self.0 {
            SwitchboardError::NoCapableNumber { .. } => {
                Some("register a number with the required capability via POST /v1/numbers")
            }
            SwitchboardError::CapabilityDenied { .. } => {
                Some("send from a number this account owns that has the required capability")
            }
            SwitchboardError::UpstreamUnavailable {
                retryable: true, ..
            } => Some("the carrier is temporarily unavailable; retry in a few seconds"),
            SwitchboardError::UpstreamUnavailable { .. } => {
                Some("check the request against the carrier error above")
            }
            SwitchboardError::Unauthorized(_) => Some("send a valid bearer token"),
            SwitchboardError::Config(_) => Some("the server is missing configuration; contact the operator"),
            _ => None,
        }
    }

    fn body(&self) -> ErrorBody {
        // Internal failures keep their detail in the logs only.
        let message = match &self.0 {
            SwitchboardError::Storage { .. } | SwitchboardError::Internal(_) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        ErrorBody {
            error: ErrorDetail {
                code: self.0.code(),
                message,
                suggestion: self.suggestion(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "api request failed");
        } else {
            tracing::debug!(code = self.0.code(), error = %self.0, "api request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
