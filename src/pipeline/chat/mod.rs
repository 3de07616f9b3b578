//! Streaming chat: one user message in, incremental text deltas out.

pub mod decoder;
pub mod stream;
pub mod transcript;

pub use decoder::Utf8StreamDecoder;
pub use stream::{send_message, DeltaStream};
pub use transcript::{ChatTranscript, Sender, TranscriptEntry};

use thiserror::Error;

use super::backend::BackendError;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[from] BackendError),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Chat request cancelled")]
    Cancelled,
}

impl ChatError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::StreamInterrupted(_) => "stream_interrupted",
            Self::Cancelled => "cancelled",
        }
    }
}
