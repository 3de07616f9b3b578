use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub sender: Sender,
}

/// Conversation history kept by the caller for display.
///
/// The chat pipeline never reads or writes it; callers feed deltas in with
/// `append_delta` to render a reply while it is being typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatTranscript {
    entries: Vec<TranscriptEntry>,
}

pub const FAILED_REPLY: &str = "Sorry, something went wrong. Please try again.";

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            text: text.into(),
            sender: Sender::User,
        });
    }

    /// Open an empty assistant entry for the reply about to stream in.
    pub fn begin_assistant(&mut self) {
        self.entries.push(TranscriptEntry {
            text: String::new(),
            sender: Sender::Assistant,
        });
    }

    /// Append to the last entry if it belongs to the assistant.
    /// Returns false when there is no open assistant entry.
    pub fn append_delta(&mut self, delta: &str) -> bool {
        match self.entries.last_mut() {
            Some(entry) if entry.sender == Sender::Assistant => {
                entry.text.push_str(delta);
                true
            }
            _ => false,
        }
    }

    /// Replace an empty assistant entry with an apology, or append a
    /// notice to a partial one.
    pub fn fail_last_assistant(&mut self) {
        match self.entries.last_mut() {
            Some(entry) if entry.sender == Sender::Assistant => {
                if entry.text.is_empty() {
                    entry.text = FAILED_REPLY.to_string();
                } else {
                    entry.text.push_str("\n\n");
                    entry.text.push_str(FAILED_REPLY);
                }
            }
            _ => self.entries.push(TranscriptEntry {
                text: FAILED_REPLY.to_string(),
                sender: Sender::Assistant,
            }),
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
