//! Error types for the tutoring workflow.
//!
//! Validation errors map to 4xx responses and are rejected before any
//! session mutation; upstream (LLM / transcript service) errors map to 5xx.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Top-level error for all workflow steps and HTTP handlers.
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("No study material provided")]
    EmptyInput,

    #[error("No concepts stored for this session; upload study material first")]
    InsufficientContext,

    #[error("Answer count does not match quiz: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Session has no active quiz to grade")]
    NoActiveQuiz,

    #[error("Not a recognizable video URL: {0}")]
    InvalidUrl(String),

    #[error("Upstream model call timed out")]
    UpstreamTimeout,

    #[error("Upstream generation failed: {0}")]
    UpstreamGeneration(String),
}

impl TutorError {
    pub fn status(&self) -> StatusCode {
        match self {
            TutorError::NotFound(_) => StatusCode::NOT_FOUND,
            TutorError::EmptyInput
            | TutorError::InsufficientContext
            | TutorError::LengthMismatch { .. }
            | TutorError::NoActiveQuiz
            | TutorError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            TutorError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            TutorError::UpstreamGeneration(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for TutorError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
