//! HTTP router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//! Layers (outermost → innermost): CORS → access log → handler.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::pipeline::backend::GenerativeBackend;

/// Build the API router with the built-in catalogs.
pub fn api_router(backend: Arc<dyn GenerativeBackend>) -> Router {
    build_router(ApiContext::new(backend))
}

/// Build the router from a pre-constructed context (custom catalogs).
pub fn build_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/diagnose", post(endpoints::diagnose::diagnose))
        .route("/chatbot", post(endpoints::chat::chatbot))
        .route("/checker/score", post(endpoints::checker::score))
        .route("/checker/symptoms", get(endpoints::checker::symptoms))
        .route("/checker/specialists", post(endpoints::checker::specialists))
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    Router::new()
        .nest("/api", routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::pipeline::backend::{BackendError, MockBackend};

    const VALID_DIAGNOSIS: &str = "Here you go:\n```json\n{\"conditions\": [{\"name\": \"Influenza\", \
        \"confidence\": \"80%\", \"explanation\": \"Fever and aches.\", \"recommendation\": \
        \"Rest and fluids.\"}], \"disclaimer\": \"Not a medical diagnosis.\"}\n```";

    fn router_with(backend: MockBackend) -> (Router, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        (api_router(backend.clone()), backend)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn text_body(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ── health ──────────────────────────────────────────────

    #[tokio::test]
    async fn health_reports_backend() {
        let (app, _) = router_with(MockBackend::new(""));
        let response = app.oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["backend"], "mock");
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (app, _) = router_with(MockBackend::new(""));
        let response = app.oneshot(get("/api/nonexistent")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ── diagnose ────────────────────────────────────────────

    #[tokio::test]
    async fn diagnose_returns_parsed_result() {
        let (app, backend) = router_with(MockBackend::new(VALID_DIAGNOSIS));
        let response = app
            .oneshot(post_json(
                "/api/diagnose",
                r#"{"symptoms": ["Fever", "Body aches"], "age": 30}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["conditions"][0]["name"], "Influenza");
        assert_eq!(json["conditions"][0]["confidence"], "80%");
        assert_eq!(json["disclaimer"], "Not a medical diagnosis.");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn diagnose_without_symptoms_is_400_and_skips_backend() {
        let (app, backend) = router_with(MockBackend::new(VALID_DIAGNOSIS));
        for body in [r#"{"symptoms": [], "age": 30}"#, r#"{"age": 30}"#] {
            let response = app.clone().oneshot(post_json("/api/diagnose", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = json_body(response).await;
            assert_eq!(json["error"], "Symptoms are required.");
        }
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn diagnose_with_bad_age_is_400() {
        let (app, backend) = router_with(MockBackend::new(VALID_DIAGNOSIS));
        for body in [
            r#"{"symptoms": ["Fever"], "age": 0}"#,
            r#"{"symptoms": ["Fever"], "age": -1}"#,
            r#"{"symptoms": ["Fever"], "age": "old"}"#,
        ] {
            let response = app.clone().oneshot(post_json("/api/diagnose", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        }
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn diagnose_unparseable_reply_returns_raw_response() {
        let raw = "I cannot format this as JSON, but it looks like a cold.";
        let (app, _) = router_with(MockBackend::new(raw));
        let response = app
            .oneshot(post_json("/api/diagnose", r#"{"symptoms": ["Cough"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], crate::api::error::PARSE_FAILURE_MESSAGE);
        assert_eq!(json["rawResponse"], raw);
    }

    #[tokio::test]
    async fn diagnose_backend_failure_is_500_without_detail() {
        let (app, _) = router_with(MockBackend::failing(BackendError::Connection(
            "http://localhost:11434".into(),
        )));
        let response = app
            .oneshot(post_json("/api/diagnose", r#"{"symptoms": ["Cough"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], crate::api::error::BACKEND_FAILURE_MESSAGE);
        assert!(json.get("rawResponse").is_none());
    }

    // ── chatbot ─────────────────────────────────────────────

    #[tokio::test]
    async fn chatbot_streams_plain_text() {
        let (app, backend) = router_with(MockBackend::with_chunks(["He", "llo", "!"]));
        let response = app
            .oneshot(post_json("/api/chatbot", r#"{"message": "hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(text_body(response).await, "Hello!");
        assert_eq!(backend.last_prompt().as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn chatbot_sends_each_delta_as_its_own_frame() {
        use http_body_util::BodyExt;

        let (app, _) = router_with(MockBackend::with_chunks(["He", "llo", "!"]));
        let response = app
            .oneshot(post_json("/api/chatbot", r#"{"message": "hi"}"#))
            .await
            .unwrap();

        let mut body = response.into_body();
        let mut frames = Vec::new();
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame.unwrap().into_data() {
                frames.push(String::from_utf8(data.to_vec()).unwrap());
            }
        }
        assert_eq!(frames, vec!["He", "llo", "!"]);
    }

    #[tokio::test]
    async fn chatbot_without_message_is_400() {
        let (app, backend) = router_with(MockBackend::with_chunks(["x"]));
        for body in ["{}", r#"{"message": ""}"#, r#"{"message": "   "}"#] {
            let response = app.clone().oneshot(post_json("/api/chatbot", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = json_body(response).await;
            assert_eq!(json["error"], "Message is required.");
        }
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn chatbot_open_failure_is_500_json() {
        let (app, _) = router_with(MockBackend::failing(BackendError::Status {
            status: 503,
            body: "overloaded".into(),
        }));
        let response = app
            .oneshot(post_json("/api/chatbot", r#"{"message": "hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], crate::api::error::BACKEND_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn chatbot_mid_stream_failure_aborts_body() {
        let (app, _) = router_with(MockBackend::interrupted_after(
            ["Partial"],
            BackendError::Interrupted("reset".into()),
        ));
        let response = app
            .oneshot(post_json("/api/chatbot", r#"{"message": "hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(to_bytes(response.into_body(), 1024).await.is_err());
    }

    #[tokio::test]
    async fn malformed_json_body_is_rejected() {
        let (app, backend) = router_with(MockBackend::new(""));
        let response = app
            .oneshot(post_json("/api/chatbot", "{not json"))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
        assert_eq!(backend.call_count(), 0);
    }

    // ── checker ─────────────────────────────────────────────

    #[tokio::test]
    async fn checker_score_ranks_conditions() {
        let (app, backend) = router_with(MockBackend::new(""));
        let response = app
            .oneshot(post_json(
                "/api/checker/score",
                r#"{"symptoms": ["Fever", "Cough", "Fatigue", "Body aches", "Headache", "Chills"]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let results = json["results"].as_array().unwrap();
        assert_eq!(results[0]["condition"]["name"], "Flu");
        assert_eq!(results[0]["matchPercentage"], 100);
        assert_eq!(results[0]["matchCount"], 6);
        assert!(results.iter().all(|r| r["matchCount"].as_u64().unwrap() > 0));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn checker_score_with_unknown_symptoms_is_empty() {
        let (app, _) = router_with(MockBackend::new(""));
        let response = app
            .oneshot(post_json("/api/checker/score", r#"{"symptoms": ["Hiccups"]}"#))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["results"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn checker_symptoms_filters_and_excludes_selected() {
        let (app, _) = router_with(MockBackend::new(""));
        let response = app
            .oneshot(get("/api/checker/symptoms?q=fe&selected=Fever"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let symptoms: Vec<&str> = json["symptoms"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_str().unwrap())
            .collect();
        assert!(!symptoms.contains(&"Fever"));
        assert!(symptoms.iter().all(|s| s.to_lowercase().contains("fe")));
    }

    #[tokio::test]
    async fn checker_specialists_for_conditions() {
        let (app, _) = router_with(MockBackend::new(""));
        let response = app
            .oneshot(post_json(
                "/api/checker/specialists",
                r#"{"conditions": ["Upper respiratory infection"]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let specialists = json["specialists"].as_array().unwrap();
        assert!(!specialists.is_empty());
        assert!(specialists
            .iter()
            .all(|d| d["specialty"] == "Pulmonologist"));
    }
}
