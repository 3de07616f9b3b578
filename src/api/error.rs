//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::chat::ChatError;
use crate::pipeline::diagnosis::DiagnosisError;

pub const BACKEND_FAILURE_MESSAGE: &str = "Error calling the generative backend.";
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse AI response.";

/// Error response body: `{error}` or `{error, rawResponse}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "rawResponse", skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Backend failure: {0}")]
    Backend(String),
    #[error("Unparseable backend response")]
    MalformedResponse { reason: String, raw: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_request",
            ApiError::Backend(_) => "backend_unavailable",
            ApiError::MalformedResponse { .. } => "malformed_backend_response",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, body) = match self {
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: detail,
                    raw_response: None,
                },
            ),
            ApiError::Backend(detail) => {
                tracing::error!(kind, %detail, "Generative backend call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: BACKEND_FAILURE_MESSAGE.to_string(),
                        raw_response: None,
                    },
                )
            }
            ApiError::MalformedResponse { reason, raw } => {
                tracing::error!(kind, %reason, raw_len = raw.len(), "Backend response not parseable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: PARSE_FAILURE_MESSAGE.to_string(),
                        raw_response: Some(raw),
                    },
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(kind, %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "An internal error occurred".to_string(),
                        raw_response: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<DiagnosisError> for ApiError {
    fn from(err: DiagnosisError) -> Self {
        match err {
            DiagnosisError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            DiagnosisError::BackendUnavailable(e) => ApiError::Backend(e.to_string()),
            DiagnosisError::MalformedBackendResponse { reason, raw } => {
                ApiError::MalformedResponse { reason, raw }
            }
            DiagnosisError::Cancelled => ApiError::Internal("diagnosis cancelled".into()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            ChatError::BackendUnavailable(e) => ApiError::Backend(e.to_string()),
            ChatError::StreamInterrupted(detail) => ApiError::Backend(detail),
            ChatError::Cancelled => ApiError::Internal("chat cancelled".into()),
        }
    }
}
