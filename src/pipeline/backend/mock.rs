use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;

use super::{BackendError, ByteStream, GenerativeBackend};

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Chunks {
        chunks: Vec<Vec<u8>>,
        then_error: Option<BackendError>,
    },
    Fail(BackendError),
    Stall(Vec<Vec<u8>>),
    Hang,
}

/// Scripted backend for tests and offline runs.
///
/// Counts calls and remembers the last prompt so callers can assert that
/// nothing was sent, or what was sent.
pub struct MockBackend {
    script: Script,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockBackend {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Answer every request with `response`; streams emit it as one chunk.
    pub fn new(response: &str) -> Self {
        Self::with_script(Script::Reply(response.to_string()))
    }

    /// Stream the given chunks, in order.
    pub fn with_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self::with_script(Script::Chunks {
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            then_error: None,
        })
    }

    /// Stream the given chunks, then fail mid-flight.
    pub fn interrupted_after<I, C>(chunks: I, error: BackendError) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self::with_script(Script::Chunks {
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            then_error: Some(error),
        })
    }

    /// Stream the given chunks, then go silent without closing.
    pub fn stalled_after<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self::with_script(Script::Stall(
            chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
        ))
    }

    /// Fail every request before any data.
    pub fn failing(error: BackendError) -> Self {
        Self::with_script(Script::Fail(error))
    }

    /// Never answer. Used to exercise cancellation.
    pub fn hanging() -> Self {
        Self::with_script(Script::Hang)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok()?.clone()
    }

    fn record(&self, prompt: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        self.record(prompt);
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Chunks { chunks, then_error } => match then_error {
                Some(err) => Err(err.clone()),
                None => Ok(String::from_utf8_lossy(&chunks.concat()).into_owned()),
            },
            Script::Fail(err) => Err(err.clone()),
            Script::Stall(_) | Script::Hang => futures_util::future::pending().await,
        }
    }

    async fn generate_stream(&self, prompt: &str) -> Result<ByteStream, BackendError> {
        self.record(prompt);
        let items: Vec<Result<Vec<u8>, BackendError>> = match &self.script {
            Script::Reply(text) => vec![Ok(text.clone().into_bytes())],
            Script::Chunks { chunks, then_error } => chunks
                .iter()
                .cloned()
                .map(Ok)
                .chain(then_error.clone().map(Err))
                .collect(),
            Script::Fail(err) => return Err(err.clone()),
            Script::Stall(chunks) => {
                let head = futures_util::stream::iter(chunks.clone().into_iter().map(Ok));
                return Ok(Box::pin(head.chain(futures_util::stream::pending())));
            }
            Script::Hang => futures_util::future::pending().await,
        };
        Ok(Box::pin(futures_util::stream::iter(items)))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
