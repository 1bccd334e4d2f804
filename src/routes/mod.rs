//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - the tutoring API (`/upload`, `/quiz/generate`, `/quiz/submit`)
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/", get(http::http_root))
        .route("/upload", post(http::http_upload))
        .route("/upload/youtube", post(http::http_upload_youtube))
        .route("/quiz/generate", get(http::http_quiz_generate))
        .route("/quiz/submit", post(http::http_quiz_submit))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::store::MemorySessionStore;
    use crate::transcript::TranscriptClient;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "test-boundary";
    const MATERIAL: &str = "Recursion is when a function calls itself. Recursion \
        needs a base case. Loops repeat statements. Loops and recursion solve \
        iteration problems. Recursion depth matters.";

    /// Router over offline state: no API key, deterministic local fallbacks.
    fn app() -> Router {
        let state = Arc::new(AppState {
            store: Arc::new(MemorySessionStore::new()),
            llm: None,
            prompts: Prompts::default(),
            transcripts: TranscriptClient::from_env(),
        });
        build_router(state)
    }

    fn upload_request(text: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\n{text}\r\n--{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        let res = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["message"], "IntelliLearn API is online");
    }

    #[tokio::test]
    async fn upload_quiz_submit_round_trip() {
        let app = app();

        // Upload study material.
        let res = app.clone().oneshot(upload_request(MATERIAL)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["status"], "success");
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert!(!body["concepts"].as_array().unwrap().is_empty());

        // Generate a quiz; the response must not leak graded fields.
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/quiz/generate?session_id={session_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let quiz = json_body(res).await;
        assert_eq!(quiz["difficulty"], "Medium");
        let questions = quiz["questions"].as_array().unwrap();
        assert_eq!(questions.len(), 5);
        for q in questions {
            let keys: Vec<&str> = q.as_object().unwrap().keys().map(|k| k.as_str()).collect();
            assert_eq!(q["options"].as_array().unwrap().len(), 4);
            assert!(!keys.contains(&"correct"));
            assert!(!keys.contains(&"explanation"));
        }

        // Submit all-wrong answers: score 0, Easy next, resources per topic.
        let answers = vec!["definitely wrong"; 5];
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/quiz/submit")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "session_id": session_id, "answers": answers }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let out = json_body(res).await;
        assert_eq!(out["score"], 0);
        assert_eq!(out["next_difficulty"], "Easy");
        let weak = out["weak_topics"].as_array().unwrap();
        assert!(!weak.is_empty());
        let recs = out["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), weak.len());
        assert!(out["feedback"].as_str().unwrap().contains("0/100"));

        // The adapted difficulty drives the next round.
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/quiz/generate?session_id={session_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let quiz = json_body(res).await;
        assert_eq!(quiz["difficulty"], "Easy");
    }

    #[tokio::test]
    async fn quiz_for_unknown_session_is_404() {
        let res = app()
            .oneshot(
                Request::builder()
                    .uri("/quiz/generate?session_id=missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_of_empty_material_is_400() {
        let res = app().oneshot(upload_request("   ")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn submit_without_active_quiz_is_400() {
        let app = app();
        let res = app.clone().oneshot(upload_request(MATERIAL)).await.unwrap();
        let session_id = json_body(res).await["session_id"].as_str().unwrap().to_string();

        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/quiz/submit")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "session_id": session_id, "answers": ["a"] }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn submit_with_wrong_answer_count_is_400() {
        let app = app();
        let res = app.clone().oneshot(upload_request(MATERIAL)).await.unwrap();
        let session_id = json_body(res).await["session_id"].as_str().unwrap().to_string();
        app.clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/quiz/generate?session_id={session_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/quiz/submit")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "session_id": session_id, "answers": ["a", "b", "c"] })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = json_body(res).await;
        assert!(body["error"].as_str().unwrap().contains("expected 5"));
    }

    #[tokio::test]
    async fn youtube_upload_with_invalid_url_is_400() {
        let res = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload/youtube")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "url": "https://example.com/not-a-video" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
