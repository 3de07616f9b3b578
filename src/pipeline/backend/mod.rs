//! Generative text backend abstraction.
//!
//! Diagnosis and chat both talk to an LLM through `GenerativeBackend`.
//! Callers construct one backend at startup and pass it into each pipeline
//! call, so tests substitute `MockBackend` without touching the network.

pub mod framing;
pub mod gemini;
pub mod mock;
pub mod ollama;

pub use gemini::GeminiClient;
pub use mock::MockBackend;
pub use ollama::OllamaClient;

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::Stream;
use thiserror::Error;

use crate::config::BackendConfig;

/// Raw response body chunks, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, BackendError>> + Send>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Backend returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Stream interrupted: {0}")]
    Interrupted(String),

    #[error("Model not installed: {0}")]
    ModelNotFound(String),
}

impl BackendError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "status",
            Self::Http(_) => "http",
            Self::ResponseParsing(_) => "response_parsing",
            Self::Interrupted(_) => "interrupted",
            Self::ModelNotFound(_) => "model_not_found",
        }
    }
}

/// LLM capability consumed by the diagnosis and chat pipelines.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send one prompt and wait for the complete text response.
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;

    /// Send one prompt and return the response body as it arrives.
    ///
    /// Errors before the first chunk (connection, non-success status) are
    /// returned here; later failures arrive as `Err` items on the stream.
    async fn generate_stream(&self, prompt: &str) -> Result<ByteStream, BackendError>;

    /// Cheap startup check that the backend can serve requests.
    async fn probe(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Short identifier for logs (`ollama`, `gemini`, `mock`).
    fn name(&self) -> &'static str;
}

/// Build the configured backend.
pub fn from_config(
    config: &BackendConfig,
    timeout: Duration,
) -> Result<Arc<dyn GenerativeBackend>, BackendError> {
    let backend: Arc<dyn GenerativeBackend> = match config {
        BackendConfig::Ollama { base_url, model } => {
            Arc::new(OllamaClient::new(base_url, model, timeout)?)
        }
        BackendConfig::Gemini {
            base_url,
            model,
            api_key,
        } => Arc::new(GeminiClient::new(base_url, model, api_key, timeout)?),
    };
    tracing::info!(backend = backend.name(), "Generative backend configured");
    Ok(backend)
}

/// Map a `reqwest` send error onto the backend taxonomy.
pub(crate) fn classify_send_error(err: reqwest::Error, base_url: &str, timeout: Duration) -> BackendError {
    if err.is_connect() {
        BackendError::Connection(base_url.to_string())
    } else if err.is_timeout() {
        BackendError::Timeout(timeout.as_secs())
    } else {
        BackendError::Http(err.to_string())
    }
}

/// Turn a non-success response into `BackendError::Status`.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}
