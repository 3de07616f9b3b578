use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};

use super::decoder::Utf8StreamDecoder;
use super::ChatError;
use crate::pipeline::backend::{BackendError, ByteStream, GenerativeBackend};
use crate::pipeline::cancel::{cancelled, CancelToken};

/// Text deltas of one chat reply, in arrival order.
///
/// Ends when the backend closes the body. A transport failure or a
/// cancellation yields exactly one terminal `Err` before the end.
pub struct DeltaStream {
    inner: Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>,
}

impl Stream for DeltaStream {
    type Item = Result<String, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl DeltaStream {
    /// Drain the stream into the full reply text.
    pub async fn collect_text(mut self) -> Result<String, ChatError> {
        let mut text = String::new();
        while let Some(delta) = self.next().await {
            text.push_str(&delta?);
        }
        Ok(text)
    }
}

struct DeltaState {
    body: ByteStream,
    decoder: Utf8StreamDecoder,
    cancel: Option<CancelToken>,
    backend: &'static str,
    deltas: usize,
    bytes: usize,
    done: bool,
}

enum Next {
    Chunk(Option<Result<Vec<u8>, BackendError>>),
    Cancelled,
}

/// Send one chat message and stream the reply.
///
/// A blank message is rejected before any network call. Failing to open the
/// stream is `BackendUnavailable`, returned before any delta.
pub async fn send_message(
    backend: &dyn GenerativeBackend,
    text: &str,
    cancel: Option<&CancelToken>,
) -> Result<DeltaStream, ChatError> {
    if text.trim().is_empty() {
        return Err(ChatError::InvalidRequest("Message is required.".into()));
    }
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(ChatError::Cancelled);
    }

    tracing::info!(
        backend = backend.name(),
        message_len = text.len(),
        "Chat request started"
    );

    let body = tokio::select! {
        opened = backend.generate_stream(text) => opened.map_err(|e| {
            tracing::warn!(
                backend = backend.name(),
                kind = e.kind(),
                error = %e,
                "Chat stream could not be opened"
            );
            ChatError::BackendUnavailable(e)
        })?,
        _ = cancelled(cancel) => {
            tracing::info!(backend = backend.name(), "Chat request cancelled before streaming");
            return Err(ChatError::Cancelled);
        }
    };

    let state = DeltaState {
        body,
        decoder: Utf8StreamDecoder::new(),
        cancel: cancel.cloned(),
        backend: backend.name(),
        deltas: 0,
        bytes: 0,
        done: false,
    };

    let inner = futures_util::stream::unfold(state, |mut st| async move {
        loop {
            if st.done {
                return None;
            }

            let next = tokio::select! {
                chunk = st.body.next() => Next::Chunk(chunk),
                _ = cancelled(st.cancel.as_ref()) => Next::Cancelled,
            };

            match next {
                Next::Chunk(Some(Ok(chunk))) => {
                    st.bytes += chunk.len();
                    let text = st.decoder.decode(&chunk);
                    if text.is_empty() {
                        continue;
                    }
                    st.deltas += 1;
                    return Some((Ok(text), st));
                }
                Next::Chunk(Some(Err(e))) => {
                    st.done = true;
                    tracing::warn!(
                        backend = st.backend,
                        deltas = st.deltas,
                        bytes = st.bytes,
                        error = %e,
                        "Chat stream interrupted"
                    );
                    return Some((Err(ChatError::StreamInterrupted(e.to_string())), st));
                }
                Next::Chunk(None) => {
                    st.done = true;
                    let tail = st.decoder.finish();
                    tracing::info!(
                        backend = st.backend,
                        deltas = st.deltas,
                        bytes = st.bytes,
                        "Chat stream complete"
                    );
                    if tail.is_empty() {
                        return None;
                    }
                    st.deltas += 1;
                    return Some((Ok(tail), st));
                }
                Next::Cancelled => {
                    st.done = true;
                    tracing::info!(
                        backend = st.backend,
                        deltas = st.deltas,
                        "Chat stream cancelled"
                    );
                    return Some((Err(ChatError::Cancelled), st));
                }
            }
        }
    });

    Ok(DeltaStream {
        inner: Box::pin(inner),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::backend::MockBackend;
    use crate::pipeline::cancel::cancel_pair;

    async fn collect(stream: DeltaStream) -> Vec<Result<String, ChatError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn deltas_arrive_in_order() {
        let backend = MockBackend::with_chunks(["He", "llo", "!"]);
        let items = collect(send_message(&backend, "hi", None).await.unwrap()).await;
        let deltas: Vec<String> = items.into_iter().map(|d| d.unwrap()).collect();
        assert_eq!(deltas, vec!["He", "llo", "!"]);
        assert_eq!(deltas.concat(), "Hello!");
        assert_eq!(backend.last_prompt().as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn blank_message_rejected_without_network_call() {
        let backend = MockBackend::with_chunks(["x"]);
        for text in ["", "   ", "\n\t"] {
            let err = send_message(&backend, text, None).await.err().unwrap();
            assert!(matches!(err, ChatError::InvalidRequest(_)));
        }
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn split_multibyte_char_is_reassembled() {
        let bytes = "Café ☕".as_bytes().to_vec();
        // split inside both 'é' and '☕'
        let chunks = vec![bytes[..4].to_vec(), bytes[4..7].to_vec(), bytes[7..].to_vec()];
        let backend = MockBackend::with_chunks(chunks);
        let stream = send_message(&backend, "coffee?", None).await.unwrap();
        let items = collect(stream).await;
        assert!(items.iter().all(|d| d.as_ref().is_ok_and(|t| !t.is_empty())));
        let text: String = items.into_iter().map(|d| d.unwrap()).collect();
        assert_eq!(text, "Café ☕");
    }

    #[tokio::test]
    async fn chunk_with_only_partial_char_yields_nothing() {
        let bytes = "é".as_bytes().to_vec();
        let backend = MockBackend::with_chunks(vec![bytes[..1].to_vec(), bytes[1..].to_vec()]);
        let items = collect(send_message(&backend, "x", None).await.unwrap()).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_deref().unwrap(), "é");
    }

    #[tokio::test]
    async fn truncated_tail_flushes_replacement_char() {
        let bytes = "é".as_bytes().to_vec();
        let backend = MockBackend::with_chunks(vec![b"ok".to_vec(), bytes[..1].to_vec()]);
        let text = send_message(&backend, "x", None)
            .await
            .unwrap()
            .collect_text()
            .await
            .unwrap();
        assert_eq!(text, "ok\u{FFFD}");
    }

    #[tokio::test]
    async fn open_failure_is_backend_unavailable() {
        let backend = MockBackend::failing(BackendError::Status {
            status: 500,
            body: "boom".into(),
        });
        let err = send_message(&backend, "hi", None).await.err().unwrap();
        assert!(matches!(err, ChatError::BackendUnavailable(_)));
        assert_eq!(err.kind(), "backend_unavailable");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn mid_stream_failure_is_terminal_error() {
        let backend = MockBackend::interrupted_after(
            ["Partial", " answer"],
            BackendError::Interrupted("connection reset".into()),
        );
        let items = collect(send_message(&backend, "hi", None).await.unwrap()).await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_deref().unwrap(), "Partial");
        assert_eq!(items[1].as_deref().unwrap(), " answer");
        assert!(matches!(items[2], Err(ChatError::StreamInterrupted(_))));
    }

    #[tokio::test]
    async fn collect_text_surfaces_interruption() {
        let backend =
            MockBackend::interrupted_after(["a"], BackendError::Interrupted("eof".into()));
        let result = send_message(&backend, "hi", None)
            .await
            .unwrap()
            .collect_text()
            .await;
        assert!(matches!(result, Err(ChatError::StreamInterrupted(_))));
    }

    #[tokio::test]
    async fn cancel_mid_stream_ends_with_cancelled() {
        let backend = MockBackend::stalled_after(["Hel"]);
        let (handle, token) = cancel_pair();
        let mut stream = send_message(&backend, "hi", Some(&token)).await.unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), "Hel");
        handle.cancel();
        assert!(matches!(stream.next().await, Some(Err(ChatError::Cancelled))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn cancel_while_opening_stream() {
        let backend = MockBackend::hanging();
        let (handle, token) = cancel_pair();
        let (result, _) = tokio::join!(send_message(&backend, "hi", Some(&token)), async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            handle.cancel();
        });
        assert!(matches!(result, Err(ChatError::Cancelled)));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_backend() {
        let backend = MockBackend::with_chunks(["x"]);
        let (handle, token) = cancel_pair();
        handle.cancel();
        let err = send_message(&backend, "hi", Some(&token)).await.err().unwrap();
        assert!(matches!(err, ChatError::Cancelled));
        assert_eq!(backend.call_count(), 0);
    }
}
