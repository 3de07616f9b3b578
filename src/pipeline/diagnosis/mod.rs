//! LLM-backed diagnosis: prompt construction, one backend round-trip,
//! fenced-JSON extraction and schema validation.

pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod types;

pub use orchestrator::diagnose;
pub use types::*;

use thiserror::Error;

use super::backend::BackendError;

#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[from] BackendError),

    #[error("Malformed backend response: {reason}")]
    MalformedBackendResponse { reason: String, raw: String },

    #[error("Diagnosis request cancelled")]
    Cancelled,
}

impl DiagnosisError {
    /// Stable identifier for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::MalformedBackendResponse { .. } => "malformed_backend_response",
            Self::Cancelled => "cancelled",
        }
    }

    /// Raw model output, when the failure was a parse failure.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::MalformedBackendResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
