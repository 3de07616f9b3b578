//! `POST /api/chatbot`: streamed chat reply.
//!
//! The response body is the concatenation of the reply deltas, sent as
//! chunked `text/plain`. Body closure marks completion. A failure after the
//! first byte cannot change the status any more, so it aborts the body.

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::StreamExt;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::chat::send_message;

#[derive(Debug, Deserialize)]
pub struct ChatbotRequest {
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn chatbot(
    State(ctx): State<ApiContext>,
    Json(req): Json<ChatbotRequest>,
) -> Result<Response, ApiError> {
    let message = req.message.unwrap_or_default();
    let deltas = send_message(ctx.backend.as_ref(), &message, None).await?;

    // Client disconnect drops the body, which drops the backend stream.
    let body = deltas.map(|delta| {
        delta.inspect_err(|e| {
            tracing::warn!(kind = e.kind(), "Chat response body aborted");
        })
    });

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}
