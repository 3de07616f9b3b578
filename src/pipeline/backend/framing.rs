//! Newline framing over arbitrarily split byte chunks.
//!
//! Ollama streams NDJSON and Gemini streams SSE; both are line oriented but
//! the transport splits chunks anywhere. `LineFramer` buffers the partial
//! tail until its newline arrives, and `framed_stream` turns a raw body
//! into a stream of the text each line carries.

use std::collections::VecDeque;

use futures_util::StreamExt;

use super::{BackendError, ByteStream};

#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and take every line it completes (without `\n`/`\r\n`).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    /// Remaining unterminated data at end of stream, if any.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

/// What a single protocol line contributes to the text stream.
#[derive(Debug, PartialEq)]
pub enum LineEvent {
    /// Text to forward.
    Text(String),
    /// Last text of the response; anything after it is ignored.
    Final(String),
    /// Keep-alives, blank separators, metadata.
    Skip,
    /// The backend reported an error in-band.
    Failed(BackendError),
}

struct FrameState<F> {
    body: ByteStream,
    framer: LineFramer,
    queue: VecDeque<Result<Vec<u8>, BackendError>>,
    finished: bool,
    parse: F,
}

impl<F> FrameState<F>
where
    F: Fn(&[u8]) -> LineEvent,
{
    fn handle_line(&mut self, line: &[u8]) {
        if self.finished {
            return;
        }
        match (self.parse)(line) {
            LineEvent::Text(text) => self.enqueue(text),
            LineEvent::Final(text) => {
                self.enqueue(text);
                self.finished = true;
            }
            LineEvent::Skip => {}
            LineEvent::Failed(err) => {
                self.queue.push_back(Err(err));
                self.finished = true;
            }
        }
    }

    fn enqueue(&mut self, text: String) {
        if !text.is_empty() {
            self.queue.push_back(Ok(text.into_bytes()));
        }
    }
}

/// Re-frame a line-oriented response body into a stream of text bytes.
///
/// `parse` maps each complete line to a `LineEvent`. Transport errors are
/// forwarded as a final `Err` item.
pub fn framed_stream<F>(body: ByteStream, parse: F) -> ByteStream
where
    F: Fn(&[u8]) -> LineEvent + Send + 'static,
{
    let state = FrameState {
        body,
        framer: LineFramer::new(),
        queue: VecDeque::new(),
        finished: false,
        parse,
    };

    Box::pin(futures_util::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.queue.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => {
                    for line in st.framer.push(&chunk) {
                        st.handle_line(&line);
                    }
                }
                Some(Err(err)) => {
                    st.queue.push_back(Err(err));
                    st.finished = true;
                }
                None => {
                    if let Some(rest) = st.framer.finish() {
                        st.handle_line(&rest);
                    }
                    st.finished = true;
                }
            }
        }
    }))
}
