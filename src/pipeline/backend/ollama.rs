use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use super::framing::{framed_stream, LineEvent};
use super::{classify_send_error, ensure_success, BackendError, ByteStream, GenerativeBackend};

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a client for `model` on the Ollama instance at `base_url`.
    ///
    /// The timeout bounds connection setup and each non-streaming request.
    /// Streaming requests only use it for the connect phase so long answers
    /// are not cut off.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout,
        })
    }

    /// Default Ollama instance at localhost:11434 with 5-minute timeout.
    pub fn default_local(model: &str) -> Result<Self, BackendError> {
        Self::new(
            crate::config::DEFAULT_OLLAMA_URL,
            model,
            Duration::from_secs(crate::config::DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Names of the models installed on the Ollama instance.
    pub async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify_send_error(e, &self.base_url, self.timeout))?;

        let parsed: OllamaTagsResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    pub async fn is_model_available(&self) -> Result<bool, BackendError> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m.starts_with(&self.model)))
    }

    async fn post_generate(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream,
        };

        let mut request = self.client.post(&url).json(&body);
        if !stream {
            request = request.timeout(self.timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_send_error(e, &self.base_url, self.timeout))?;
        ensure_success(response).await
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// One NDJSON line of a streaming /api/generate response.
#[derive(Deserialize)]
struct OllamaStreamLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

fn parse_stream_line(line: &[u8]) -> LineEvent {
    if line.iter().all(u8::is_ascii_whitespace) {
        return LineEvent::Skip;
    }
    match serde_json::from_slice::<OllamaStreamLine>(line) {
        Ok(OllamaStreamLine {
            error: Some(error), ..
        }) => LineEvent::Failed(BackendError::Interrupted(error)),
        Ok(OllamaStreamLine {
            response,
            done: true,
            ..
        }) => LineEvent::Final(response),
        Ok(OllamaStreamLine { response, .. }) => LineEvent::Text(response),
        Err(e) => LineEvent::Failed(BackendError::ResponseParsing(e.to_string())),
    }
}

#[async_trait]
impl GenerativeBackend for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let response = self.post_generate(prompt, false).await?;
        let parsed: OllamaGenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.timeout.as_secs())
            } else {
                BackendError::ResponseParsing(e.to_string())
            }
        })?;
        Ok(parsed.response)
    }

    async fn generate_stream(&self, prompt: &str) -> Result<ByteStream, BackendError> {
        let response = self.post_generate(prompt, true).await?;
        let body: ByteStream = Box::pin(response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| BackendError::Interrupted(e.to_string()))
        }));
        Ok(framed_stream(body, parse_stream_line))
    }

    async fn probe(&self) -> Result<(), BackendError> {
        if self.is_model_available().await? {
            Ok(())
        } else {
            Err(BackendError::ModelNotFound(self.model.clone()))
        }
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
