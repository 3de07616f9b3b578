//! Google Gemini adapter (`generateContent` / `streamGenerateContent`).

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use super::framing::{framed_stream, LineEvent};
use super::{classify_send_error, ensure_success, BackendError, ByteStream, GenerativeBackend};

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            client,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    async fn post(&self, url: &str, prompt: &str, stream: bool) -> Result<reqwest::Response, BackendError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let mut request = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body);
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

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

fn parse_sse_line(line: &[u8]) -> LineEvent {
    let Some(data) = line.strip_prefix(b"data:") else {
        return LineEvent::Skip;
    };
    match serde_json::from_slice::<GenerateContentResponse>(data.trim_ascii_start()) {
        Ok(GenerateContentResponse {
            error: Some(error), ..
        }) => LineEvent::Failed(BackendError::Interrupted(error.message)),
        Ok(chunk) => LineEvent::Text(chunk.text()),
        Err(e) => LineEvent::Failed(BackendError::ResponseParsing(e.to_string())),
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let url = self.endpoint("generateContent");
        let response = self.post(&url, prompt, false).await?;
        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))?;
        if let Some(error) = parsed.error {
            return Err(BackendError::ResponseParsing(error.message));
        }
        Ok(parsed.text())
    }

    async fn generate_stream(&self, prompt: &str) -> Result<ByteStream, BackendError> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.post(&url, prompt, true).await?;
        let body: ByteStream = Box::pin(response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| BackendError::Interrupted(e.to_string()))
        }));
        Ok(framed_stream(body, parse_sse_line))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
